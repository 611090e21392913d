// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! KCL script parser using pest
//!
//! Each line is parsed on its own, so a bad statement never affects its
//! neighbours. Dropped statements are reported as `ParseRejection`
//! diagnostics.

use crate::ast::{
    BooleanParams, ChamferParams, CircularPatternParams, Diagnostic, DiagnosticKind, DraftParams,
    EdgeSelector, Entry, ExtrudeParams, FilletParams, GridPatternParams, HelixParams,
    LinearPatternParams, LoftParams, MirrorParams, RevolveParams, RotateParams, ScaleParams,
    ShellParams, Specification, SpiralPatternParams, SweepParams, TorusParams, TranslateParams,
};
use crate::config::EngineConfig;
use crate::error::ParseError;
use crate::geometry::{BooleanKind, FaceDirection, Primitive};
use ahash::{AHashMap, AHashSet};
use nalgebra::{Point2, Point3, Vector3};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use tracing::{debug, warn};

#[derive(Parser)]
#[grammar = "io/kcl.pest"]
struct KclParser;

type Result<T> = std::result::Result<T, ParseError>;

/// Parse a script with the default configuration. Never fails; rejected
/// statements are dropped.
pub fn parse_script(source: &str) -> Specification {
    parse_script_with_diagnostics(source).0
}

/// Parse a script, also returning a diagnostic per dropped statement
pub fn parse_script_with_diagnostics(source: &str) -> (Specification, Vec<Diagnostic>) {
    parse_script_with_config(source, &EngineConfig::default())
}

/// Parse a script, filling omitted tessellation counts from `config`
pub fn parse_script_with_config(
    source: &str,
    config: &EngineConfig,
) -> (Specification, Vec<Diagnostic>) {
    let mut state = ParseState::new(config);
    let mut diagnostics = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let Some(text) = statement_text(raw) else {
            continue;
        };
        if let Err(err) = state.parse_line(text, line) {
            warn!(line, error = %err, "statement rejected");
            diagnostics.push(
                Diagnostic::new(DiagnosticKind::ParseRejection, err.to_string()).at_line(line),
            );
        }
    }

    debug!(entries = state.spec.len(), rejected = diagnostics.len(), "script parsed");
    (state.spec, diagnostics)
}

/// Statement carried by a line, unwrapping the `// @stmt` form. Plain
/// comment lines and blank lines carry none.
fn statement_text(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.strip_prefix("//") {
        Some(comment) => comment
            .trim_start()
            .strip_prefix('@')
            .filter(|s| !s.trim().is_empty()),
        None => Some(trimmed),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Selector {
    Whole,
    Face(String),
    Edge(i64),
    AllEdges,
}

#[derive(Debug, Clone, PartialEq)]
struct Reference {
    name: String,
    selector: Selector,
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Number(f64),
    List(Vec<Value>),
    Str(String),
    Bool(bool),
    Ref(Reference),
}

impl Value {
    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn as_numbers<const N: usize>(&self) -> Option<[f64; N]> {
        match self {
            Value::List(items) if items.len() == N => {
                let mut out = [0.0; N];
                for (slot, item) in out.iter_mut().zip(items) {
                    *slot = item.as_number()?;
                }
                Some(out)
            }
            _ => None,
        }
    }

    fn as_point2(&self) -> Option<Point2<f64>> {
        self.as_numbers::<2>().map(|[x, y]| Point2::new(x, y))
    }

    fn as_point2_list(&self) -> Option<Vec<Point2<f64>>> {
        match self {
            Value::List(items) => items.iter().map(Value::as_point2).collect(),
            _ => None,
        }
    }
}

/// Named and positional arguments of one call
struct Params {
    statement: String,
    named: AHashMap<String, Value>,
    positional: Vec<Value>,
}

/// Argument names match regardless of case and underscores, so
/// `open_faces` and `openFaces` are the same argument
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

impl Params {
    fn get(&self, names: &[&str], index: usize) -> Option<&Value> {
        names
            .iter()
            .find_map(|name| self.named.get(&normalize(name)))
            .or_else(|| self.positional.get(index))
    }

    fn missing(&self, argument: &'static str) -> ParseError {
        ParseError::MissingArgument {
            statement: self.statement.clone(),
            argument,
        }
    }

    fn typed<T>(
        &self,
        names: &[&'static str],
        index: usize,
        expected: &'static str,
        convert: impl Fn(&Value) -> Option<T>,
    ) -> Result<Option<T>> {
        match self.get(names, index) {
            None => Ok(None),
            Some(value) => convert(value).map(Some).ok_or(ParseError::InvalidArgument {
                argument: names[0],
                expected,
            }),
        }
    }

    fn require<T>(&self, names: &[&'static str], value: Option<T>) -> Result<T> {
        value.ok_or_else(|| self.missing(names[0]))
    }

    fn opt_number(&self, names: &[&'static str], index: usize) -> Result<Option<f64>> {
        self.typed(names, index, "a number", Value::as_number)
    }

    fn number(&self, names: &[&'static str], index: usize) -> Result<f64> {
        let value = self.opt_number(names, index)?;
        self.require(names, value)
    }

    fn number_or(&self, names: &[&'static str], index: usize, default: f64) -> Result<f64> {
        Ok(self.opt_number(names, index)?.unwrap_or(default))
    }

    fn integer(&self, names: &[&'static str], index: usize) -> Result<i64> {
        let value = self.typed(names, index, "an integer", |v| {
            v.as_number()
                .filter(|n| n.fract() == 0.0 && n.abs() < i64::MAX as f64)
                .map(|n| n as i64)
        })?;
        self.require(names, value)
    }

    fn count(&self, names: &[&'static str], index: usize) -> Result<Option<u32>> {
        self.typed(names, index, "a non-negative integer", |v| {
            v.as_number()
                .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= u32::MAX as f64)
                .map(|n| n as u32)
        })
    }

    fn opt_vector(&self, names: &[&'static str], index: usize) -> Result<Option<Vector3<f64>>> {
        self.typed(names, index, "a list of 3 numbers", |v| {
            v.as_numbers::<3>().map(Vector3::from)
        })
    }

    fn vector(&self, names: &[&'static str], index: usize) -> Result<Vector3<f64>> {
        let value = self.opt_vector(names, index)?;
        self.require(names, value)
    }

    fn vector_or(
        &self,
        names: &[&'static str],
        index: usize,
        default: Vector3<f64>,
    ) -> Result<Vector3<f64>> {
        Ok(self.opt_vector(names, index)?.unwrap_or(default))
    }

    /// A scalar stands for the same value on every axis
    fn opt_scalar_or_vector(
        &self,
        names: &[&'static str],
        index: usize,
    ) -> Result<Option<Vector3<f64>>> {
        self.typed(names, index, "a number or a list of 3 numbers", |v| match v {
            Value::Number(n) => Some(Vector3::repeat(*n)),
            other => other.as_numbers::<3>().map(Vector3::from),
        })
    }

    fn opt_point(&self, names: &[&'static str], index: usize) -> Result<Option<Point3<f64>>> {
        Ok(self.opt_vector(names, index)?.map(Point3::from))
    }

    fn point_or_origin(&self, names: &[&'static str], index: usize) -> Result<Point3<f64>> {
        Ok(self.opt_point(names, index)?.unwrap_or_else(Point3::origin))
    }

    fn profile(&self, names: &[&'static str], index: usize) -> Result<Vec<Point2<f64>>> {
        let value = self.typed(names, index, "a list of [x, y] points", Value::as_point2_list)?;
        self.require(names, value)
    }

    fn path(&self, names: &[&'static str], index: usize) -> Result<Vec<Point3<f64>>> {
        let value = self.typed(names, index, "a list of [x, y, z] points", |v| match v {
            Value::List(items) => items
                .iter()
                .map(|p| p.as_numbers::<3>().map(|[x, y, z]| Point3::new(x, y, z)))
                .collect(),
            _ => None,
        })?;
        self.require(names, value)
    }

    fn sections(&self, names: &[&'static str], index: usize) -> Result<Vec<Vec<Point2<f64>>>> {
        let value = self.typed(names, index, "a list of profiles", |v| match v {
            Value::List(items) => items.iter().map(Value::as_point2_list).collect(),
            _ => None,
        })?;
        self.require(names, value)
    }

    fn numbers(&self, names: &[&'static str], index: usize) -> Result<Vec<f64>> {
        let value = self.typed(names, index, "a list of numbers", |v| match v {
            Value::List(items) => items.iter().map(Value::as_number).collect(),
            _ => None,
        })?;
        self.require(names, value)
    }

    fn boolean_or(&self, names: &[&'static str], index: usize, default: bool) -> Result<bool> {
        let value = self.typed(names, index, "true or false", |v| match v {
            Value::Bool(b) => Some(*b),
            _ => None,
        })?;
        Ok(value.unwrap_or(default))
    }

    fn reference(&self, names: &[&'static str], index: usize) -> Result<Reference> {
        let value = self.typed(names, index, "a reference", |v| match v {
            Value::Ref(r) => Some(r.clone()),
            Value::Str(s) => Some(Reference {
                name: s.clone(),
                selector: Selector::Whole,
            }),
            _ => None,
        })?;
        self.require(names, value)
    }

    /// Whole-solid reference, returning the id
    fn source(&self, names: &[&'static str], index: usize) -> Result<String> {
        let reference = self.reference(names, index)?;
        match reference.selector {
            Selector::Whole => Ok(reference.name),
            _ => Err(ParseError::InvalidArgument {
                argument: names[0],
                expected: "a plain reference",
            }),
        }
    }

    fn faces(&self, names: &[&'static str], index: usize) -> Result<Vec<FaceDirection>> {
        let value = self.typed(names, index, "a list of face names", |v| match v {
            Value::List(items) => items.iter().map(face_of).collect(),
            _ => None,
        })?;
        Ok(value.unwrap_or_default())
    }
}

fn face_of(value: &Value) -> Option<FaceDirection> {
    let name = match value {
        Value::Str(s) => s.as_str(),
        Value::Ref(Reference {
            name,
            selector: Selector::Whole,
        }) => name.as_str(),
        _ => return None,
    };
    name.parse().ok()
}

/// Per-call parser state: the specification so far and the id counters
struct ParseState<'c> {
    config: &'c EngineConfig,
    spec: Specification,
    ids: AHashSet<String>,
    counters: AHashMap<String, usize>,
}

/// What a statement declares, before its id is settled
enum Record {
    Primitive(Primitive),
    Extrude(ExtrudeParams),
    Fillet(FilletParams),
    Chamfer(ChamferParams),
    Boolean(BooleanParams),
    Revolve(RevolveParams),
    LinearPattern(LinearPatternParams),
    CircularPattern(CircularPatternParams),
    Shell(ShellParams),
    Mirror(MirrorParams),
    Scale(ScaleParams),
    Rotate(RotateParams),
    Translate(TranslateParams),
    Sweep(SweepParams),
    Loft(LoftParams),
    Draft(DraftParams),
    Torus(TorusParams),
    Helix(HelixParams),
    GridPattern(GridPatternParams),
    SpiralPattern(SpiralPatternParams),
}

impl<'c> ParseState<'c> {
    fn new(config: &'c EngineConfig) -> Self {
        Self {
            config,
            spec: Specification::new(),
            ids: AHashSet::new(),
            counters: AHashMap::new(),
        }
    }

    fn parse_line(&mut self, text: &str, line: usize) -> Result<()> {
        let mut pairs = KclParser::parse(Rule::line, text)
            .map_err(|e| ParseError::Syntax(e.variant.message().into_owned()))?;
        let Some(statement) = pairs
            .next()
            .and_then(|l| l.into_inner().find(|p| p.as_rule() == Rule::statement))
        else {
            return Ok(());
        };

        let mut binding = None;
        let mut call = None;
        for part in statement.into_inner() {
            match part.as_rule() {
                Rule::binding => {
                    binding = part
                        .into_inner()
                        .find(|p| p.as_rule() == Rule::ident)
                        .map(|p| p.as_str().to_string());
                }
                Rule::call => call = Some(part),
                _ => {}
            }
        }
        let call = call.ok_or_else(|| ParseError::Syntax("expected a call".into()))?;
        let (name, params) = parse_call(call)?;
        let record = self.build(&name, &params)?;

        let id = match binding {
            Some(id) if self.ids.contains(&id) => {
                debug!(line, %id, "redeclaration ignored, first declaration wins");
                return Ok(());
            }
            Some(id) => id,
            None => self.generate_id(&name, &record),
        };
        debug!(line, %id, statement = %name, "statement accepted");
        self.ids.insert(id.clone());
        self.push(id, line, record);
        Ok(())
    }

    /// `box1`, `cyl2`, `union1` for generative statements,
    /// `<source>_<kind>` for statements modifying a source
    fn generate_id(&mut self, name: &str, record: &Record) -> String {
        let source = match record {
            Record::Extrude(p) => Some(p.source_id.as_str()),
            Record::Fillet(p) => Some(p.source_id.as_str()),
            Record::Chamfer(p) => Some(p.source_id.as_str()),
            Record::LinearPattern(p) => Some(p.source_id.as_str()),
            Record::CircularPattern(p) => Some(p.source_id.as_str()),
            Record::Shell(p) => Some(p.source_id.as_str()),
            Record::Mirror(p) => Some(p.source_id.as_str()),
            Record::Scale(p) => Some(p.source_id.as_str()),
            Record::Rotate(p) => Some(p.source_id.as_str()),
            Record::Translate(p) => Some(p.source_id.as_str()),
            Record::Draft(p) => Some(p.source_id.as_str()),
            Record::GridPattern(p) => Some(p.source_id.as_str()),
            Record::SpiralPattern(p) => Some(p.source_id.as_str()),
            _ => None,
        };

        if let Some(source) = source {
            let base = format!("{source}_{name}");
            if !self.ids.contains(&base) {
                return base;
            }
            return self.next_free(&format!("{base}_"), 2);
        }
        let prefix = match record {
            Record::Primitive(Primitive::Cylinder { .. }) => "cyl",
            _ => name,
        };
        self.next_free(prefix, 1)
    }

    fn next_free(&mut self, prefix: &str, start: usize) -> String {
        let counter = self.counters.entry(prefix.to_string()).or_insert(start - 1);
        loop {
            *counter += 1;
            let candidate = format!("{prefix}{counter}");
            if !self.ids.contains(&candidate) {
                return candidate;
            }
        }
    }

    fn build(&self, name: &str, p: &Params) -> Result<Record> {
        let segments = self.config.default_segments;
        let record = match name {
            "box" | "cube" => {
                let size = p
                    .opt_scalar_or_vector(&["size"], 0)?
                    .unwrap_or_else(|| Vector3::repeat(1.0));
                Record::Primitive(Primitive::cube(size, p.point_or_origin(&["center"], 1)?))
            }
            "cylinder" => Record::Primitive(Primitive::Cylinder {
                radius: p.number_or(&["radius", "r"], 0, 1.0)?,
                height: p.number_or(&["height", "h"], 1, 1.0)?,
                center: p.point_or_origin(&["center"], 2)?,
                segments: p.count(&["segments"], 3)?.unwrap_or(segments),
            }),
            "sphere" => Record::Primitive(Primitive::Sphere {
                radius: p.number_or(&["radius", "r"], 0, 1.0)?,
                center: p.point_or_origin(&["center"], 1)?,
                segments: p.count(&["segments"], 2)?.unwrap_or(segments),
                rings: p.count(&["rings"], 3)?.unwrap_or(self.config.sphere_rings),
            }),
            "cone" => Record::Primitive(Primitive::Cone {
                radius: p.number_or(&["radius", "r"], 0, 1.0)?,
                height: p.number_or(&["height", "h"], 1, 1.0)?,
                center: p.point_or_origin(&["center"], 2)?,
                segments: p.count(&["segments"], 3)?.unwrap_or(segments),
                radius_top: p.number_or(&["radius_top"], 4, 0.0)?,
            }),

            "extrude" => {
                let target = p.reference(&["face", "target"], 0)?;
                let face = match &target.selector {
                    Selector::Face(face) => face.parse().map_err(|_| ParseError::InvalidArgument {
                        argument: "face",
                        expected: "one of top, bottom, left, right, front, back",
                    })?,
                    _ => {
                        return Err(ParseError::InvalidArgument {
                            argument: "face",
                            expected: "a face reference like `box1.face.top`",
                        })
                    }
                };
                Record::Extrude(ExtrudeParams {
                    source_id: target.name,
                    face,
                    distance: p.number(&["distance"], 1)?,
                })
            }
            "fillet" => {
                let (source_id, edges) = edge_target(p)?;
                Record::Fillet(FilletParams {
                    source_id,
                    edges,
                    radius: p.number(&["radius"], 1)?,
                    segments: p.count(&["segments"], 2)?,
                })
            }
            "chamfer" => {
                let (source_id, edges) = edge_target(p)?;
                Record::Chamfer(ChamferParams {
                    source_id,
                    edges,
                    distance: p.number(&["distance"], 1)?,
                })
            }
            "union" | "subtract" | "intersect" => {
                let operation = match name {
                    "union" => BooleanKind::Union,
                    "subtract" => BooleanKind::Subtract,
                    _ => BooleanKind::Intersect,
                };
                Record::Boolean(BooleanParams {
                    operation,
                    source_a_id: p.source(&["a", "source_a"], 0)?,
                    source_b_id: p.source(&["b", "source_b"], 1)?,
                })
            }
            "revolve" => Record::Revolve(RevolveParams {
                profile: p.profile(&["profile"], 0)?,
                axis: p.vector_or(&["axis"], 1, Vector3::y())?,
                angle: p.number_or(&["angle"], 2, 360.0)?,
                center: p.point_or_origin(&["center"], 3)?,
                segments: p.count(&["segments"], 4)?,
            }),
            "linear_pattern" => Record::LinearPattern(LinearPatternParams {
                source_id: p.source(&["source"], 0)?,
                direction: p.vector(&["direction"], 1)?,
                count: p.integer(&["count"], 2)?,
                spacing: p.number(&["spacing"], 3)?,
            }),
            "circular_pattern" => Record::CircularPattern(CircularPatternParams {
                source_id: p.source(&["source"], 0)?,
                axis: p.vector(&["axis"], 1)?,
                center: p.point_or_origin(&["center"], 2)?,
                count: p.integer(&["count"], 3)?,
                angle: p.number_or(&["angle"], 4, 360.0)?,
            }),
            "grid_pattern" => Record::GridPattern(GridPatternParams {
                source_id: p.source(&["source"], 0)?,
                direction1: p.vector(&["direction1"], 1)?,
                count1: p.integer(&["count1"], 2)?,
                spacing1: p.number(&["spacing1"], 3)?,
                direction2: p.vector(&["direction2"], 4)?,
                count2: p.integer(&["count2"], 5)?,
                spacing2: p.number(&["spacing2"], 6)?,
            }),
            "spiral_pattern" => Record::SpiralPattern(SpiralPatternParams {
                source_id: p.source(&["source"], 0)?,
                axis: p.vector_or(&["axis"], 1, Vector3::y())?,
                center: p.point_or_origin(&["center"], 2)?,
                count: p.integer(&["count"], 3)?,
                angle: p.number(&["angle"], 4)?,
                pitch: p.number_or(&["pitch"], 5, 0.0)?,
                radius_growth: p.number_or(&["radius_growth"], 6, 0.0)?,
            }),
            "shell" => Record::Shell(ShellParams {
                source_id: p.source(&["source"], 0)?,
                thickness: p.number(&["thickness"], 1)?,
                open_faces: p.faces(&["open_faces"], 2)?,
            }),
            "mirror" => Record::Mirror(MirrorParams {
                source_id: p.source(&["source"], 0)?,
                normal: p.vector(&["normal", "plane"], 1)?,
                point: p.point_or_origin(&["point"], 2)?,
                keep_original: p.boolean_or(&["keep_original"], 3, false)?,
            }),
            "translate" => Record::Translate(TranslateParams {
                source_id: p.source(&["source"], 0)?,
                offset: p.vector(&["offset", "by"], 1)?,
            }),
            "rotate" => Record::Rotate(RotateParams {
                source_id: p.source(&["source"], 0)?,
                axis: p.vector(&["axis"], 1)?,
                angle: p.number(&["angle"], 2)?,
                center: p.opt_point(&["center"], 3)?,
            }),
            "scale" => {
                let factor = p.opt_scalar_or_vector(&["factor"], 1)?;
                Record::Scale(ScaleParams {
                    source_id: p.source(&["source"], 0)?,
                    factor: p.require(&["factor"], factor)?,
                    center: p.opt_point(&["center"], 2)?,
                })
            }
            "sweep" => Record::Sweep(SweepParams {
                profile: p.profile(&["profile"], 0)?,
                path: p.path(&["path"], 1)?,
            }),
            "loft" => Record::Loft(LoftParams {
                sections: p.sections(&["sections"], 0)?,
                heights: p.numbers(&["heights"], 1)?,
            }),
            "draft" => Record::Draft(DraftParams {
                source_id: p.source(&["source"], 0)?,
                angle: p.number(&["angle"], 1)?,
                direction: p.vector_or(&["direction"], 2, Vector3::y())?,
                neutral: p.opt_number(&["neutral"], 3)?,
            }),
            "torus" => Record::Torus(TorusParams {
                major_radius: p.number(&["major_radius"], 0)?,
                minor_radius: p.number(&["minor_radius"], 1)?,
                center: p.point_or_origin(&["center"], 2)?,
                segments: p.count(&["segments"], 3)?,
                tube_segments: p.count(&["tube_segments"], 4)?,
            }),
            "helix" => Record::Helix(HelixParams {
                radius: p.number(&["radius"], 0)?,
                pitch: p.number(&["pitch"], 1)?,
                turns: p.number(&["turns"], 2)?,
                tube_radius: p.number_or(&["tube_radius"], 3, 0.1)?,
                center: p.point_or_origin(&["center"], 4)?,
                segments: p.count(&["segments"], 5)?,
            }),
            other => return Err(ParseError::UnknownStatement(other.to_string())),
        };
        Ok(record)
    }

    fn push(&mut self, id: String, line: usize, record: Record) {
        let spec = &mut self.spec;
        macro_rules! add {
            ($list:ident, $params:expr) => {
                spec.$list.push(Entry::new(id, $params).at_line(line))
            };
        }
        match record {
            Record::Primitive(p) => add!(primitives, p),
            Record::Extrude(p) => add!(extrude, p),
            Record::Fillet(p) => add!(fillet, p),
            Record::Chamfer(p) => add!(chamfer, p),
            Record::Boolean(p) => add!(boolean, p),
            Record::Revolve(p) => add!(revolve, p),
            Record::LinearPattern(p) => add!(linear_pattern, p),
            Record::CircularPattern(p) => add!(circular_pattern, p),
            Record::Shell(p) => add!(shell, p),
            Record::Mirror(p) => add!(mirror, p),
            Record::Scale(p) => add!(scale, p),
            Record::Rotate(p) => add!(rotate, p),
            Record::Translate(p) => add!(translate, p),
            Record::Sweep(p) => add!(sweep, p),
            Record::Loft(p) => add!(loft, p),
            Record::Draft(p) => add!(draft, p),
            Record::Torus(p) => add!(torus, p),
            Record::Helix(p) => add!(helix, p),
            Record::GridPattern(p) => add!(grid_pattern, p),
            Record::SpiralPattern(p) => add!(spiral_pattern, p),
        }
    }
}

fn edge_target(p: &Params) -> Result<(String, EdgeSelector)> {
    let target = p.reference(&["edge", "target"], 0)?;
    let edges = match target.selector {
        Selector::Edge(index) => EdgeSelector::Index(index),
        Selector::AllEdges => EdgeSelector::All,
        _ => {
            return Err(ParseError::InvalidArgument {
                argument: "edge",
                expected: "an edge reference like `box1.edge[0]` or `box1.edges`",
            })
        }
    };
    Ok((target.name, edges))
}

fn parse_call(pair: Pair<'_, Rule>) -> Result<(String, Params)> {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .map(|p| p.as_str().to_string())
        .ok_or_else(|| ParseError::Syntax("expected a statement name".into()))?;
    let mut params = Params {
        statement: name.clone(),
        named: AHashMap::new(),
        positional: Vec::new(),
    };

    for arg in inner {
        let Some(arg) = arg.into_inner().next() else {
            continue;
        };
        match arg.as_rule() {
            Rule::named => {
                let mut parts = arg.into_inner();
                let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                    return Err(ParseError::Syntax("malformed named argument".into()));
                };
                params.named.insert(normalize(key.as_str()), parse_value(value)?);
            }
            _ => params.positional.push(parse_value(arg)?),
        }
    }
    Ok((name, params))
}

fn parse_value(pair: Pair<'_, Rule>) -> Result<Value> {
    let pair = if pair.as_rule() == Rule::value {
        pair.into_inner()
            .next()
            .ok_or_else(|| ParseError::Syntax("empty value".into()))?
    } else {
        pair
    };

    match pair.as_rule() {
        Rule::number => {
            let text = pair.as_str();
            let n: f64 = text
                .parse()
                .map_err(|_| ParseError::Syntax(format!("bad number `{text}`")))?;
            if !n.is_finite() {
                return Err(ParseError::NonFinite(text.to_string()));
            }
            Ok(Value::Number(n))
        }
        Rule::boolean => Ok(Value::Bool(pair.as_str() == "true")),
        Rule::string => Ok(Value::Str(
            pair.into_inner()
                .next()
                .map(|t| t.as_str().to_string())
                .unwrap_or_default(),
        )),
        Rule::list => pair.into_inner().map(parse_value).collect::<Result<_>>().map(Value::List),
        Rule::reference => parse_reference(pair).map(Value::Ref),
        _ => Err(ParseError::Syntax(format!("unexpected `{}`", pair.as_str()))),
    }
}

fn parse_reference(pair: Pair<'_, Rule>) -> Result<Reference> {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .map(|p| p.as_str().to_string())
        .ok_or_else(|| ParseError::Syntax("expected a name".into()))?;
    let selector = match inner.next() {
        None => Selector::Whole,
        Some(sel) => match sel.as_rule() {
            Rule::face => Selector::Face(
                sel.into_inner()
                    .next()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default(),
            ),
            Rule::all_edges => Selector::AllEdges,
            Rule::edge => {
                let text = sel.into_inner().next().map(|p| p.as_str()).unwrap_or("");
                let index = text
                    .parse()
                    .map_err(|_| ParseError::Syntax(format!("bad edge index `{text}`")))?;
                Selector::Edge(index)
            }
            _ => Selector::Whole,
        },
    };
    Ok(Reference { name, selector })
}
