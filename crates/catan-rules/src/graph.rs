//! Board topology: hexes, vertices (corners) and edges (sides) of the standard
//! 19-hex island, plus its nine ports.
//!
//! The graph is generated once per game from a seed and never changes afterwards.
//! Vertices and edges live in arenas and are addressed by small integer handles
//! ([`VertexId`], [`EdgeId`], [`HexId`]). Hexes that share a geometric corner are
//! collapsed onto one vertex by keying corners on their rounded pixel position.

use crate::hex::HexCoord;
use crate::rng::Mulberry32;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Number of hexes on the standard board
pub const STANDARD_HEX_COUNT: usize = 19;
/// Number of vertices on the standard board
pub const STANDARD_VERTEX_COUNT: usize = 54;
/// Number of edges on the standard board
pub const STANDARD_EDGE_COUNT: usize = 72;

/// Corner positions are rounded to this many units per hex radius before keying
const PIXEL_PRECISION: f64 = 1000.0;

/// Rings of land around the centre hex
const ISLAND_RADIUS: u32 = 2;

/// Standard layout: centre, ring 1, ring 2 (axial q, r)
const STANDARD_LAYOUT: [(i32, i32); STANDARD_HEX_COUNT] = [
    (0, 0),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (2, 0),
    (2, -1),
    (2, -2),
    (1, -2),
    (0, -2),
    (-1, -1),
    (-2, 0),
    (-2, 1),
    (-2, 2),
    (-1, 2),
    (0, 2),
    (1, 1),
];

/// Number tokens, one per producing hex
const STANDARD_TOKENS: [u8; 18] = [2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];

/// Port kinds clockwise around the coast
const STANDARD_PORTS: [PortKind; 9] = [
    PortKind::Any,
    PortKind::Specific(Resource::Wheat),
    PortKind::Specific(Resource::Ore),
    PortKind::Any,
    PortKind::Specific(Resource::Sheep),
    PortKind::Any,
    PortKind::Any,
    PortKind::Specific(Resource::Brick),
    PortKind::Specific(Resource::Wood),
];

/// Gaps (in coastal edges) between consecutive ports; sums to the 30 coastal edges
const PORT_SPACING: [usize; 9] = [3, 3, 4, 3, 3, 4, 3, 3, 4];

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident($inner:ty), $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            /// Position in the owning arena
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

handle!(
    /// Handle of a hex tile
    HexId(u8),
    "h"
);
handle!(
    /// Handle of a vertex (corner)
    VertexId(u16),
    "v"
);
handle!(
    /// Handle of an edge (side)
    EdgeId(u16),
    "e"
);

/// The five producible resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Wood,
    Brick,
    Sheep,
    Wheat,
    Ore,
}

impl Resource {
    /// All resource types
    pub const ALL: [Resource; 5] = [
        Resource::Wood,
        Resource::Brick,
        Resource::Sheep,
        Resource::Wheat,
        Resource::Ore,
    ];
}

/// What a hex produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    Resource(Resource),
    Desert,
}

/// A single land hex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HexTile {
    pub id: HexId,
    pub coord: HexCoord,
    pub terrain: Terrain,
    /// Dice number that triggers production (never on the desert)
    pub number: Option<u8>,
    /// Corners clockwise from the upper-right one
    pub vertices: [VertexId; 6],
    /// Sides; side `i` joins corner `i` and corner `i + 1`
    pub edges: [EdgeId; 6],
}

impl HexTile {
    /// The resource this hex produces, if any
    pub fn resource(&self) -> Option<Resource> {
        match self.terrain {
            Terrain::Resource(r) => Some(r),
            Terrain::Desert => None,
        }
    }
}

/// A corner shared by one to three hexes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vertex {
    pub id: VertexId,
    pub hexes: Vec<HexId>,
    pub neighbors: Vec<VertexId>,
    pub edges: Vec<EdgeId>,
}

/// A side joining two vertices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub vertices: [VertexId; 2],
    pub hexes: Vec<HexId>,
    pub neighbors: Vec<EdgeId>,
}

impl Edge {
    /// The endpoint opposite `vertex`
    pub fn other_end(&self, vertex: VertexId) -> VertexId {
        if self.vertices[0] == vertex {
            self.vertices[1]
        } else {
            self.vertices[0]
        }
    }
}

/// Resource filter of a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
    /// 3:1 for any resource
    Any,
    /// 2:1 for one resource
    Specific(Resource),
}

impl PortKind {
    /// The exchange rate for this port
    pub fn ratio(&self) -> u32 {
        match self {
            PortKind::Any => 3,
            PortKind::Specific(_) => 2,
        }
    }
}

/// A port and the two coastal vertices that grant access to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    pub kind: PortKind,
    pub vertices: [VertexId; 2],
}

/// Immutable board topology generated from a seed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardGraph {
    pub seed: u32,
    pub hexes: Vec<HexTile>,
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
    pub ports: Vec<Port>,
    /// Where the robber starts (always the desert)
    pub robber_start: HexId,
}

impl Default for HexId {
    fn default() -> Self {
        HexId(0)
    }
}

impl BoardGraph {
    /// Build the standard board for a seed
    pub fn from_seed(seed: u32) -> Self {
        let mut rng = Mulberry32::new(seed);
        Self::generate(seed, &mut rng)
    }

    /// Build the standard board drawing from an already seeded stream.
    ///
    /// The stream is advanced by exactly two shuffles (terrain, then tokens), so a
    /// caller can keep drawing from it afterwards for deck order.
    pub fn generate(seed: u32, rng: &mut Mulberry32) -> Self {
        let mut terrains = standard_terrain();
        terrains.shuffle(rng);
        let mut tokens = STANDARD_TOKENS.to_vec();
        tokens.shuffle(rng);
        let mut tokens = tokens.into_iter();

        let mut vertex_ids: HashMap<(i64, i64), VertexId> = HashMap::new();
        let mut edge_ids: HashMap<(VertexId, VertexId), EdgeId> = HashMap::new();
        let mut positions: Vec<(f64, f64)> = Vec::new();
        let mut vertices: Vec<Vertex> = Vec::new();
        let mut edges: Vec<Edge> = Vec::new();
        let mut hexes: Vec<HexTile> = Vec::with_capacity(STANDARD_HEX_COUNT);
        let mut robber_start = HexId(0);

        for (index, (&(q, r), terrain)) in STANDARD_LAYOUT.iter().zip(terrains).enumerate() {
            let id = HexId(index as u8);
            let coord = HexCoord::new(q, r);
            let number = match terrain {
                Terrain::Desert => {
                    robber_start = id;
                    None
                }
                Terrain::Resource(_) => tokens.next(),
            };

            let mut corners = [VertexId(0); 6];
            for (corner, slot) in corners.iter_mut().enumerate() {
                let pixel = coord.corner_pixel(corner, 1.0);
                let vid = *vertex_ids.entry(pixel_key(pixel)).or_insert_with(|| {
                    let vid = VertexId(vertices.len() as u16);
                    vertices.push(Vertex {
                        id: vid,
                        hexes: Vec::new(),
                        neighbors: Vec::new(),
                        edges: Vec::new(),
                    });
                    positions.push(pixel);
                    vid
                });
                vertices[vid.index()].hexes.push(id);
                *slot = vid;
            }

            let mut sides = [EdgeId(0); 6];
            for (side, slot) in sides.iter_mut().enumerate() {
                let a = corners[side];
                let b = corners[(side + 1) % 6];
                let key = if a < b { (a, b) } else { (b, a) };
                let eid = *edge_ids.entry(key).or_insert_with(|| {
                    let eid = EdgeId(edges.len() as u16);
                    edges.push(Edge {
                        id: eid,
                        vertices: [key.0, key.1],
                        hexes: Vec::new(),
                        neighbors: Vec::new(),
                    });
                    eid
                });
                edges[eid.index()].hexes.push(id);
                *slot = eid;
            }

            hexes.push(HexTile {
                id,
                coord,
                terrain,
                number,
                vertices: corners,
                edges: sides,
            });
        }

        for edge in &edges {
            let [a, b] = edge.vertices;
            vertices[a.index()].neighbors.push(b);
            vertices[a.index()].edges.push(edge.id);
            vertices[b.index()].neighbors.push(a);
            vertices[b.index()].edges.push(edge.id);
        }
        for vertex in &mut vertices {
            vertex.neighbors.sort();
            vertex.edges.sort();
        }
        for index in 0..edges.len() {
            let [a, b] = edges[index].vertices;
            let mut neighbors: Vec<EdgeId> = vertices[a.index()]
                .edges
                .iter()
                .chain(vertices[b.index()].edges.iter())
                .copied()
                .filter(|e| e.index() != index)
                .collect();
            neighbors.sort();
            neighbors.dedup();
            edges[index].neighbors = neighbors;
        }

        let ports = standard_ports(&edges, &positions);

        Self {
            seed,
            hexes,
            vertices,
            edges,
            ports,
            robber_start,
        }
    }

    /// Look up a hex
    pub fn hex(&self, id: HexId) -> Option<&HexTile> {
        self.hexes.get(id.index())
    }

    /// Look up a vertex
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.index())
    }

    /// Look up an edge
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    /// The edge joining two vertices, if they are adjacent
    pub fn edge_between(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.vertex(a)?
            .edges
            .iter()
            .copied()
            .find(|e| self.edges[e.index()].vertices.contains(&b))
    }

    /// Whether this graph has the shape of the standard board
    pub fn is_standard(&self) -> bool {
        self.hexes.len() == STANDARD_HEX_COUNT
            && self.vertices.len() == STANDARD_VERTEX_COUNT
            && self.edges.len() == STANDARD_EDGE_COUNT
            && self.hex(self.robber_start).is_some_and(|h| h.terrain == Terrain::Desert)
            && self
                .hexes
                .iter()
                .all(|h| h.coord.distance_to(&HexCoord::default()) <= ISLAND_RADIUS)
    }
}

fn pixel_key((x, y): (f64, f64)) -> (i64, i64) {
    (
        (x * PIXEL_PRECISION).round() as i64,
        (y * PIXEL_PRECISION).round() as i64,
    )
}

fn standard_terrain() -> Vec<Terrain> {
    let mut terrain = Vec::with_capacity(STANDARD_HEX_COUNT);
    for (resource, count) in [
        (Resource::Wood, 4),
        (Resource::Sheep, 4),
        (Resource::Wheat, 4),
        (Resource::Brick, 3),
        (Resource::Ore, 3),
    ] {
        terrain.extend(std::iter::repeat(Terrain::Resource(resource)).take(count));
    }
    terrain.push(Terrain::Desert);
    terrain
}

/// Lay the standard ports on the coast, walking coastal edges clockwise by angle
fn standard_ports(edges: &[Edge], positions: &[(f64, f64)]) -> Vec<Port> {
    let mut coastal: Vec<(f64, &Edge)> = edges
        .iter()
        .filter(|e| e.hexes.len() == 1)
        .map(|e| {
            let (ax, ay) = positions[e.vertices[0].index()];
            let (bx, by) = positions[e.vertices[1].index()];
            (((ay + by) / 2.0).atan2((ax + bx) / 2.0), e)
        })
        .collect();
    coastal.sort_by(|(a, ea), (b, eb)| a.total_cmp(b).then(ea.id.cmp(&eb.id)));

    let mut ports = Vec::with_capacity(STANDARD_PORTS.len());
    let mut cursor = 0;
    for (kind, gap) in STANDARD_PORTS.iter().zip(PORT_SPACING) {
        if let Some((_, edge)) = coastal.get(cursor) {
            ports.push(Port {
                kind: *kind,
                vertices: edge.vertices,
            });
        }
        cursor += gap;
    }
    ports
}
