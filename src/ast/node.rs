// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Typed script records
//!
//! A [`Specification`] holds one list per operation kind. Every record is an
//! [`Entry`]: a unique id, the script line it came from, and the
//! operation's parameters flattened next to them.

use crate::geometry::{BooleanKind, FaceDirection, Primitive};
use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// One declared operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<T> {
    pub id: String,
    /// 1-based script line, 0 when the record did not come from a script
    #[serde(default)]
    pub line: usize,
    #[serde(flatten)]
    pub params: T,
}

impl<T> Entry<T> {
    pub fn new(id: impl Into<String>, params: T) -> Self {
        Self {
            id: id.into(),
            line: 0,
            params,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }
}

/// Which edges of a box an edge operator targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeSelector {
    Index(i64),
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtrudeParams {
    pub source_id: String,
    pub face: FaceDirection,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilletParams {
    pub source_id: String,
    pub edges: EdgeSelector,
    pub radius: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChamferParams {
    pub source_id: String,
    pub edges: EdgeSelector,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanParams {
    pub operation: BooleanKind,
    pub source_a_id: String,
    pub source_b_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevolveParams {
    pub profile: Vec<Point2<f64>>,
    pub axis: Vector3<f64>,
    /// Degrees
    pub angle: f64,
    pub center: Point3<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearPatternParams {
    pub source_id: String,
    pub direction: Vector3<f64>,
    pub count: i64,
    pub spacing: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircularPatternParams {
    pub source_id: String,
    pub axis: Vector3<f64>,
    pub center: Point3<f64>,
    pub count: i64,
    /// Degrees spanned by the copies
    pub angle: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellParams {
    pub source_id: String,
    pub thickness: f64,
    #[serde(default)]
    pub open_faces: Vec<FaceDirection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorParams {
    pub source_id: String,
    pub normal: Vector3<f64>,
    pub point: Point3<f64>,
    #[serde(default)]
    pub keep_original: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleParams {
    pub source_id: String,
    pub factor: Vector3<f64>,
    /// Pivot, the bounding-box center when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Point3<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotateParams {
    pub source_id: String,
    pub axis: Vector3<f64>,
    /// Degrees
    pub angle: f64,
    /// Pivot, the bounding-box center when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Point3<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateParams {
    pub source_id: String,
    pub offset: Vector3<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepParams {
    pub profile: Vec<Point2<f64>>,
    pub path: Vec<Point3<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoftParams {
    pub sections: Vec<Vec<Point2<f64>>>,
    pub heights: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftParams {
    pub source_id: String,
    /// Degrees
    pub angle: f64,
    pub direction: Vector3<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neutral: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TorusParams {
    pub major_radius: f64,
    pub minor_radius: f64,
    pub center: Point3<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tube_segments: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelixParams {
    pub radius: f64,
    pub pitch: f64,
    pub turns: f64,
    pub tube_radius: f64,
    pub center: Point3<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridPatternParams {
    pub source_id: String,
    pub direction1: Vector3<f64>,
    pub count1: i64,
    pub spacing1: f64,
    pub direction2: Vector3<f64>,
    pub count2: i64,
    pub spacing2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpiralPatternParams {
    pub source_id: String,
    pub axis: Vector3<f64>,
    pub center: Point3<f64>,
    pub count: i64,
    /// Degrees between copies
    pub angle: f64,
    pub pitch: f64,
    #[serde(default)]
    pub radius_growth: f64,
}

/// Evaluation categories in their fixed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Primitives,
    Extrude,
    Fillet,
    Boolean,
    Chamfer,
    Revolve,
    LinearPattern,
    CircularPattern,
    Shell,
    Torus,
    Helix,
    Mirror,
    Scale,
    Rotate,
    Translate,
    Sweep,
    Loft,
    Draft,
    GridPattern,
    SpiralPattern,
}

impl Category {
    pub const ORDER: [Category; 20] = [
        Category::Primitives,
        Category::Extrude,
        Category::Fillet,
        Category::Boolean,
        Category::Chamfer,
        Category::Revolve,
        Category::LinearPattern,
        Category::CircularPattern,
        Category::Shell,
        Category::Torus,
        Category::Helix,
        Category::Mirror,
        Category::Scale,
        Category::Rotate,
        Category::Translate,
        Category::Sweep,
        Category::Loft,
        Category::Draft,
        Category::GridPattern,
        Category::SpiralPattern,
    ];

    /// Operators that create a new visible artifact
    pub fn is_generative(self) -> bool {
        matches!(
            self,
            Category::Primitives
                | Category::Boolean
                | Category::Revolve
                | Category::Sweep
                | Category::Loft
                | Category::Torus
                | Category::Helix
        )
    }
}

/// Borrowed view of one entry, whatever its kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperationKind<'a> {
    Primitive(&'a Primitive),
    Extrude(&'a ExtrudeParams),
    Fillet(&'a FilletParams),
    Chamfer(&'a ChamferParams),
    Boolean(&'a BooleanParams),
    Revolve(&'a RevolveParams),
    LinearPattern(&'a LinearPatternParams),
    CircularPattern(&'a CircularPatternParams),
    Shell(&'a ShellParams),
    Mirror(&'a MirrorParams),
    Scale(&'a ScaleParams),
    Rotate(&'a RotateParams),
    Translate(&'a TranslateParams),
    Sweep(&'a SweepParams),
    Loft(&'a LoftParams),
    Draft(&'a DraftParams),
    Torus(&'a TorusParams),
    Helix(&'a HelixParams),
    GridPattern(&'a GridPatternParams),
    SpiralPattern(&'a SpiralPatternParams),
}

impl<'a> OperationKind<'a> {
    pub fn category(&self) -> Category {
        match self {
            OperationKind::Primitive(_) => Category::Primitives,
            OperationKind::Extrude(_) => Category::Extrude,
            OperationKind::Fillet(_) => Category::Fillet,
            OperationKind::Chamfer(_) => Category::Chamfer,
            OperationKind::Boolean(_) => Category::Boolean,
            OperationKind::Revolve(_) => Category::Revolve,
            OperationKind::LinearPattern(_) => Category::LinearPattern,
            OperationKind::CircularPattern(_) => Category::CircularPattern,
            OperationKind::Shell(_) => Category::Shell,
            OperationKind::Mirror(_) => Category::Mirror,
            OperationKind::Scale(_) => Category::Scale,
            OperationKind::Rotate(_) => Category::Rotate,
            OperationKind::Translate(_) => Category::Translate,
            OperationKind::Sweep(_) => Category::Sweep,
            OperationKind::Loft(_) => Category::Loft,
            OperationKind::Draft(_) => Category::Draft,
            OperationKind::Torus(_) => Category::Torus,
            OperationKind::Helix(_) => Category::Helix,
            OperationKind::GridPattern(_) => Category::GridPattern,
            OperationKind::SpiralPattern(_) => Category::SpiralPattern,
        }
    }

    /// Ids this operation reads
    pub fn sources(&self) -> Vec<&'a str> {
        match *self {
            OperationKind::Extrude(p) => vec![p.source_id.as_str()],
            OperationKind::Fillet(p) => vec![p.source_id.as_str()],
            OperationKind::Chamfer(p) => vec![p.source_id.as_str()],
            OperationKind::Boolean(p) => vec![p.source_a_id.as_str(), p.source_b_id.as_str()],
            OperationKind::LinearPattern(p) => vec![p.source_id.as_str()],
            OperationKind::CircularPattern(p) => vec![p.source_id.as_str()],
            OperationKind::Shell(p) => vec![p.source_id.as_str()],
            OperationKind::Mirror(p) => vec![p.source_id.as_str()],
            OperationKind::Scale(p) => vec![p.source_id.as_str()],
            OperationKind::Rotate(p) => vec![p.source_id.as_str()],
            OperationKind::Translate(p) => vec![p.source_id.as_str()],
            OperationKind::Draft(p) => vec![p.source_id.as_str()],
            OperationKind::GridPattern(p) => vec![p.source_id.as_str()],
            OperationKind::SpiralPattern(p) => vec![p.source_id.as_str()],
            OperationKind::Primitive(_)
            | OperationKind::Revolve(_)
            | OperationKind::Sweep(_)
            | OperationKind::Loft(_)
            | OperationKind::Torus(_)
            | OperationKind::Helix(_) => Vec::new(),
        }
    }
}

/// One entry with its id and line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Operation<'a> {
    pub id: &'a str,
    pub line: usize,
    pub kind: OperationKind<'a>,
}

impl<'a> Operation<'a> {
    pub fn category(&self) -> Category {
        self.kind.category()
    }

    pub fn sources(&self) -> Vec<&'a str> {
        self.kind.sources()
    }

    /// Id of the node this operation creates or changes
    pub fn target(&self) -> &'a str {
        if self.category().is_generative() {
            self.id
        } else {
            self.sources().first().copied().unwrap_or(self.id)
        }
    }
}

/// Parsed, typed representation of a modeling script
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Specification {
    pub primitives: Vec<Entry<Primitive>>,
    pub extrude: Vec<Entry<ExtrudeParams>>,
    pub fillet: Vec<Entry<FilletParams>>,
    pub chamfer: Vec<Entry<ChamferParams>>,
    pub boolean: Vec<Entry<BooleanParams>>,
    pub revolve: Vec<Entry<RevolveParams>>,
    pub linear_pattern: Vec<Entry<LinearPatternParams>>,
    pub circular_pattern: Vec<Entry<CircularPatternParams>>,
    pub shell: Vec<Entry<ShellParams>>,
    pub mirror: Vec<Entry<MirrorParams>>,
    pub scale: Vec<Entry<ScaleParams>>,
    pub rotate: Vec<Entry<RotateParams>>,
    pub translate: Vec<Entry<TranslateParams>>,
    pub sweep: Vec<Entry<SweepParams>>,
    pub loft: Vec<Entry<LoftParams>>,
    pub draft: Vec<Entry<DraftParams>>,
    pub torus: Vec<Entry<TorusParams>>,
    pub helix: Vec<Entry<HelixParams>>,
    pub grid_pattern: Vec<Entry<GridPatternParams>>,
    pub spiral_pattern: Vec<Entry<SpiralPatternParams>>,
}

fn view<'a, T>(
    list: &'a [Entry<T>],
    wrap: fn(&'a T) -> OperationKind<'a>,
) -> impl Iterator<Item = Operation<'a>> + 'a {
    list.iter().map(move |e| Operation {
        id: &e.id,
        line: e.line,
        kind: wrap(&e.params),
    })
}

impl Specification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries of one category, in declaration order
    pub fn category(&self, category: Category) -> Vec<Operation<'_>> {
        match category {
            Category::Primitives => view(&self.primitives, OperationKind::Primitive).collect(),
            Category::Extrude => view(&self.extrude, OperationKind::Extrude).collect(),
            Category::Fillet => view(&self.fillet, OperationKind::Fillet).collect(),
            Category::Chamfer => view(&self.chamfer, OperationKind::Chamfer).collect(),
            Category::Boolean => view(&self.boolean, OperationKind::Boolean).collect(),
            Category::Revolve => view(&self.revolve, OperationKind::Revolve).collect(),
            Category::LinearPattern => {
                view(&self.linear_pattern, OperationKind::LinearPattern).collect()
            }
            Category::CircularPattern => {
                view(&self.circular_pattern, OperationKind::CircularPattern).collect()
            }
            Category::Shell => view(&self.shell, OperationKind::Shell).collect(),
            Category::Mirror => view(&self.mirror, OperationKind::Mirror).collect(),
            Category::Scale => view(&self.scale, OperationKind::Scale).collect(),
            Category::Rotate => view(&self.rotate, OperationKind::Rotate).collect(),
            Category::Translate => view(&self.translate, OperationKind::Translate).collect(),
            Category::Sweep => view(&self.sweep, OperationKind::Sweep).collect(),
            Category::Loft => view(&self.loft, OperationKind::Loft).collect(),
            Category::Draft => view(&self.draft, OperationKind::Draft).collect(),
            Category::Torus => view(&self.torus, OperationKind::Torus).collect(),
            Category::Helix => view(&self.helix, OperationKind::Helix).collect(),
            Category::GridPattern => view(&self.grid_pattern, OperationKind::GridPattern).collect(),
            Category::SpiralPattern => {
                view(&self.spiral_pattern, OperationKind::SpiralPattern).collect()
            }
        }
    }

    /// Every entry in the fixed category order
    pub fn operations(&self) -> Vec<Operation<'_>> {
        Category::ORDER
            .iter()
            .flat_map(|&c| self.category(c))
            .collect()
    }

    /// Every entry in script order (line, then category order)
    pub fn declaration_order(&self) -> Vec<Operation<'_>> {
        let mut ops: Vec<(usize, Operation<'_>)> = self.operations().into_iter().enumerate().collect();
        ops.sort_by_key(|(index, op)| (op.line, *index));
        ops.into_iter().map(|(_, op)| op).collect()
    }

    pub fn len(&self) -> usize {
        Category::ORDER.iter().map(|&c| self.category(c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when any entry already uses `id`
    pub fn contains_id(&self, id: &str) -> bool {
        self.operations().iter().any(|op| op.id == id)
    }

    /// Category of the entry that creates artifact `id`, if any
    pub fn producer_category(&self, id: &str) -> Option<Category> {
        self.operations()
            .into_iter()
            .find(|op| op.category().is_generative() && op.id == id)
            .map(|op| op.category())
    }
}
