// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Evaluator - walks a [`Specification`] and builds the artifact graph
//!
//! Each entry is planned against the current graph without mutating it and
//! the plan is committed afterwards, so a failing or panicking operator
//! leaves the graph exactly as it was before that entry.

use super::{
    ArtifactGraph, ArtifactNode, DependencyGraph, Diagnostic, DiagnosticKind,
    EdgeSelector, Operation, OperationKind, Specification,
};
use crate::config::{EngineConfig, EvaluationOrder};
use crate::error::OperatorError;
use crate::geometry::descriptors::BOX_EDGE_COUNT;
use crate::geometry::{torus_mesh, torus_radii, BooleanAdapter, FaceDirection, Mesh, Primitive};
use crate::ops::{self, transform, Helix, Spiral, TransformOp};
use ahash::{AHashMap, AHashSet};
use nalgebra::{Point3, Vector3};
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;
use tracing::{debug, info, instrument, warn};

/// Requested and applied values closer than this are not reported as clamps
const CLAMP_TOLERANCE: f64 = 1e-12;

/// Graph plus everything reported while building it
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evaluation {
    pub graph: ArtifactGraph,
    pub diagnostics: Vec<Diagnostic>,
}

impl Evaluation {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// What happens to a node's primitive back-reference
#[derive(Debug)]
enum SpecChange {
    Keep,
    Set(Primitive),
    Clear,
}

#[derive(Debug)]
enum Change {
    /// New visible node; `hide` ids leave the visible list first
    Create { node: ArtifactNode, hide: Vec<String> },
    /// Replace the geometry of an existing node
    Update {
        id: String,
        mesh: Mesh,
        spec: SpecChange,
    },
}

#[derive(Debug)]
struct Outcome {
    change: Change,
    notes: Vec<DiagnosticKind>,
}

impl Outcome {
    fn create(node: ArtifactNode) -> Self {
        Self {
            change: Change::Create {
                node,
                hide: Vec::new(),
            },
            notes: Vec::new(),
        }
    }

    fn update(id: &str, mesh: Mesh, spec: SpecChange) -> Self {
        Self {
            change: Change::Update {
                id: id.to_string(),
                mesh,
                spec,
            },
            notes: Vec::new(),
        }
    }

    fn with_notes(mut self, notes: impl IntoIterator<Item = DiagnosticKind>) -> Self {
        self.notes.extend(notes);
        self
    }
}

#[derive(Debug)]
enum Failure {
    /// Referenced id has no node or no geometry
    Missing(String),
    Operator(OperatorError),
}

impl From<OperatorError> for Failure {
    fn from(err: OperatorError) -> Self {
        Failure::Operator(err)
    }
}

fn clamp_note(parameter: &str, requested: f64, applied: f64) -> Option<DiagnosticKind> {
    (requested.is_finite() && (requested - applied).abs() > CLAMP_TOLERANCE).then(|| {
        DiagnosticKind::DegenerateParameterClamp {
            parameter: parameter.to_string(),
            requested,
            applied,
        }
    })
}

fn edge_note(edges: EdgeSelector) -> Option<DiagnosticKind> {
    match edges {
        EdgeSelector::Index(index) if !(0..BOX_EDGE_COUNT as i64).contains(&index) => {
            Some(DiagnosticKind::EdgeIndexOutOfRange { index })
        }
        _ => None,
    }
}

/// Box an entry rebuilds from its primitive, with the edge treatment it
/// leaves behind
fn box_rebuild<'a>(kind: &OperationKind<'a>) -> Option<(&'a str, Option<&'static str>)> {
    match *kind {
        OperationKind::Fillet(p) => Some((p.source_id.as_str(), Some("fillet"))),
        OperationKind::Chamfer(p) => Some((p.source_id.as_str(), Some("chamfer"))),
        OperationKind::Extrude(p) => Some((p.source_id.as_str(), None)),
        OperationKind::Shell(p) => Some((p.source_id.as_str(), None)),
        _ => None,
    }
}

fn source<'g>(
    graph: &'g ArtifactGraph,
    id: &str,
) -> Result<(&'g Mesh, Option<&'g Primitive>), Failure> {
    let node = graph
        .get(id)
        .ok_or_else(|| Failure::Missing(id.to_string()))?;
    let mesh = node
        .geometry
        .as_ref()
        .ok_or_else(|| Failure::Missing(id.to_string()))?;
    Ok((mesh, node.spec.as_ref()))
}

/// Size and center of a box back-reference
fn box_dims(
    operation: &'static str,
    primitive: Option<&Primitive>,
) -> Result<(Vector3<f64>, Point3<f64>), OperatorError> {
    match primitive {
        Some(Primitive::Box { size, center }) => Ok((*size, *center)),
        other => Err(OperatorError::UnsupportedTarget {
            operation,
            target: other.map_or("a derived solid", Primitive::kind).to_string(),
        }),
    }
}

/// Pivot used when a transform gives none
fn default_pivot(mesh: &Mesh) -> Point3<f64> {
    if mesh.is_empty() {
        Point3::origin()
    } else {
        mesh.bounding_box().center()
    }
}

fn count(value: i64) -> usize {
    usize::try_from(value.max(0)).unwrap_or(0)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "operator panicked".to_string())
}

/// Builds an [`ArtifactGraph`] from a [`Specification`]
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'k> {
    config: &'k EngineConfig,
    booleans: &'k OnceLock<BooleanAdapter>,
}

impl<'k> Evaluator<'k> {
    pub fn new(config: &'k EngineConfig, booleans: &'k OnceLock<BooleanAdapter>) -> Self {
        Self { config, booleans }
    }

    /// Evaluate every entry. Never fails: problems become diagnostics.
    #[instrument(skip_all, fields(entries = spec.len(), order = ?self.config.order))]
    pub fn evaluate(&self, spec: &Specification) -> Evaluation {
        let mut graph = ArtifactGraph::new();
        let mut diagnostics = Vec::new();
        let mut attempted = AHashSet::new();
        // Boxes whose mesh carries a fillet or chamfer their primitive lacks
        let mut treated = AHashMap::new();

        for op in self.schedule(spec, &mut diagnostics) {
            self.run_entry(spec, &mut graph, &op, &attempted, &mut treated, &mut diagnostics);
            if op.category().is_generative() {
                attempted.insert(op.id);
            }
        }

        info!(
            visible = graph.artifacts.len(),
            diagnostics = diagnostics.len(),
            "evaluation finished"
        );
        Evaluation { graph, diagnostics }
    }

    fn schedule<'s>(
        &self,
        spec: &'s Specification,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Operation<'s>> {
        match self.config.order {
            EvaluationOrder::Category => spec.operations(),
            EvaluationOrder::Dependency => {
                let ops = spec.declaration_order();
                let sorted = DependencyGraph::from_operations(&ops).topological_order();
                if !sorted.cyclic.is_empty() {
                    let ids: Vec<String> =
                        sorted.cyclic.iter().map(|&i| ops[i].id.to_string()).collect();
                    warn!(?ids, "reference cycle, falling back to declaration order");
                    let message = format!("entries reference each other: {}", ids.join(", "));
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::DependencyCycle { ids },
                        message,
                    ));
                }
                sorted
                    .order
                    .iter()
                    .chain(&sorted.cyclic)
                    .map(|&i| ops[i])
                    .collect()
            }
        }
    }

    fn run_entry(
        &self,
        spec: &Specification,
        graph: &mut ArtifactGraph,
        op: &Operation<'_>,
        attempted: &AHashSet<&str>,
        treated: &mut AHashMap<String, &'static str>,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        debug!(id = op.id, category = ?op.category(), line = op.line, "evaluating entry");
        let report = |kind: DiagnosticKind, message: String| {
            Diagnostic::new(kind, message)
                .for_entry(op.id)
                .at_line(op.line)
        };

        let planned = panic::catch_unwind(AssertUnwindSafe(|| self.plan(graph, op)));
        match planned {
            Ok(Ok(mut outcome)) => {
                if let Some((target, treatment)) = box_rebuild(&op.kind) {
                    if let Some(discarded) = treated.get(target) {
                        outcome.notes.push(DiagnosticKind::RebuiltFromPrimitive {
                            discarded: discarded.to_string(),
                        });
                    }
                    match treatment {
                        Some(treatment) => treated.insert(target.to_string(), treatment),
                        None => treated.remove(target),
                    };
                }
                for note in outcome.notes {
                    let message = match &note {
                        DiagnosticKind::EdgeIndexOutOfRange { index } => {
                            format!("edge index {index} is outside 0..=11, using edge 0")
                        }
                        DiagnosticKind::DegenerateParameterClamp {
                            parameter,
                            requested,
                            applied,
                        } => format!("{parameter} {requested} clamped to {applied}"),
                        DiagnosticKind::RebuiltFromPrimitive { discarded } => {
                            let target = box_rebuild(&op.kind).map_or(op.id, |(id, _)| id);
                            format!(
                                "`{target}` rebuilt from its box, dropping the earlier {discarded}"
                            )
                        }
                        _ => String::new(),
                    };
                    debug!(id = op.id, %message, "parameter adjusted");
                    diagnostics.push(report(note, message));
                }
                commit(graph, outcome.change);
            }
            Ok(Err(Failure::Missing(reference))) => {
                let forward = !graph.contains(&reference)
                    && !attempted.contains(reference.as_str())
                    && spec.producer_category(&reference).is_some();
                let message = if forward {
                    format!("`{reference}` is referenced before the entry producing it runs")
                } else if graph.contains(&reference) {
                    format!("`{reference}` has no geometry")
                } else {
                    format!("unknown id `{reference}`")
                };
                debug!(id = op.id, %message, "entry skipped");
                diagnostics.push(report(
                    DiagnosticKind::MissingReference { reference, forward },
                    message,
                ));
            }
            Ok(Err(Failure::Operator(err @ OperatorError::UnsupportedTarget { .. }))) => {
                warn!(id = op.id, error = %err, "unsupported target");
                diagnostics.push(report(DiagnosticKind::UnsupportedTarget, err.to_string()));
            }
            Ok(Err(Failure::Operator(err))) => {
                warn!(id = op.id, error = %err, "operator failed");
                diagnostics.push(report(DiagnosticKind::OperatorFailure, err.to_string()));
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(id = op.id, %message, "operator panicked");
                diagnostics.push(report(DiagnosticKind::OperatorFailure, message));
            }
        }
    }

    fn plan(&self, graph: &ArtifactGraph, op: &Operation<'_>) -> Result<Outcome, Failure> {
        let segments = self.config.default_segments;
        match op.kind {
            OperationKind::Primitive(primitive) => {
                if !primitive.is_finite() {
                    return Err(OperatorError::NonFinite("dimensions").into());
                }
                Ok(Outcome::create(ArtifactNode::from_primitive(
                    op.id,
                    primitive.clone(),
                    primitive.to_mesh(),
                )))
            }

            OperationKind::Extrude(p) => {
                let (_, primitive) = source(graph, &p.source_id)?;
                let primitive = primitive.ok_or_else(|| OperatorError::UnsupportedTarget {
                    operation: "extrude",
                    target: "a derived solid".to_string(),
                })?;
                let extrusion = ops::extrude(primitive, p.face, p.distance)?;
                let note = clamp_note("distance", p.distance, extrusion.applied);
                let mesh = extrusion.primitive.to_mesh();
                Ok(
                    Outcome::update(&p.source_id, mesh, SpecChange::Set(extrusion.primitive))
                        .with_notes(note),
                )
            }

            OperationKind::Fillet(p) => {
                let (_, primitive) = source(graph, &p.source_id)?;
                let (size, center) = box_dims("fillet", primitive)?;
                let segments = p.segments.unwrap_or(self.config.fillet_segments);
                let mesh = match p.edges {
                    EdgeSelector::Index(i) => {
                        ops::fillet_box_edge(&size, &center, i, p.radius, segments)?
                    }
                    EdgeSelector::All => ops::fillet_box_all(&size, &center, p.radius, segments)?,
                };
                let applied = ops::fillet::effective_radius(&size, p.radius);
                Ok(Outcome::update(&p.source_id, mesh, SpecChange::Keep)
                    .with_notes(edge_note(p.edges))
                    .with_notes(clamp_note("radius", p.radius, applied)))
            }

            OperationKind::Chamfer(p) => {
                let (_, primitive) = source(graph, &p.source_id)?;
                let (size, center) = box_dims("chamfer", primitive)?;
                let all = matches!(p.edges, EdgeSelector::All);
                let mesh = match p.edges {
                    EdgeSelector::Index(i) => ops::chamfer_box_edge(&size, &center, i, p.distance)?,
                    EdgeSelector::All => ops::chamfer_box_all(&size, &center, p.distance)?,
                };
                let applied = ops::chamfer::effective_distance(&size, p.distance, all);
                Ok(Outcome::update(&p.source_id, mesh, SpecChange::Keep)
                    .with_notes(edge_note(p.edges))
                    .with_notes(clamp_note("distance", p.distance, applied)))
            }

            OperationKind::Boolean(p) => {
                let (a, _) = source(graph, &p.source_a_id)?;
                let (b, _) = source(graph, &p.source_b_id)?;
                let mesh = self
                    .booleans
                    .get_or_init(BooleanAdapter::default)
                    .apply(a, b, p.operation)?;
                Ok(Outcome {
                    change: Change::Create {
                        node: ArtifactNode::solid(op.id, mesh),
                        hide: vec![p.source_a_id.clone(), p.source_b_id.clone()],
                    },
                    notes: Vec::new(),
                })
            }

            OperationKind::Revolve(p) => {
                let mesh = ops::revolve(
                    &p.profile,
                    &p.axis,
                    p.angle,
                    &p.center,
                    p.segments.unwrap_or(segments),
                )?;
                Ok(Outcome::create(ArtifactNode::solid(op.id, mesh)))
            }

            OperationKind::Sweep(p) => {
                let mesh = ops::sweep(&p.profile, &p.path)?;
                Ok(Outcome::create(ArtifactNode::solid(op.id, mesh)))
            }

            OperationKind::Loft(p) => {
                let mesh = ops::loft(&p.sections, &p.heights)?;
                let applied = ops::loft::separated_heights(&p.heights);
                let notes: Vec<_> = p
                    .heights
                    .iter()
                    .zip(&applied)
                    .enumerate()
                    .filter_map(|(i, (&requested, &height))| {
                        clamp_note(&format!("heights[{i}]"), requested, height)
                    })
                    .collect();
                Ok(Outcome::create(ArtifactNode::solid(op.id, mesh)).with_notes(notes))
            }

            OperationKind::Torus(p) => {
                for (name, value) in [
                    ("major_radius", p.major_radius),
                    ("minor_radius", p.minor_radius),
                ] {
                    if !value.is_finite() {
                        return Err(OperatorError::NonFinite(name).into());
                    }
                }
                if !crate::utils::math::is_finite3(&p.center.coords) {
                    return Err(OperatorError::NonFinite("center").into());
                }
                let (major, minor) = torus_radii(p.major_radius, p.minor_radius);
                let notes = [
                    clamp_note("major_radius", p.major_radius.abs(), major),
                    clamp_note("minor_radius", p.minor_radius.abs(), minor),
                ];
                let mesh = torus_mesh(
                    major,
                    minor,
                    p.center,
                    p.segments.unwrap_or(segments),
                    p.tube_segments.unwrap_or(self.config.sphere_rings),
                );
                Ok(Outcome::create(ArtifactNode::solid(op.id, mesh))
                    .with_notes(notes.into_iter().flatten()))
            }

            OperationKind::Helix(p) => {
                let mesh = ops::helix(&Helix {
                    radius: p.radius,
                    pitch: p.pitch,
                    turns: p.turns,
                    tube_radius: p.tube_radius,
                    center: p.center,
                    segments: p.segments.unwrap_or(segments),
                })?;
                Ok(Outcome::create(ArtifactNode::solid(op.id, mesh)))
            }

            OperationKind::LinearPattern(p) => {
                let (mesh, _) = source(graph, &p.source_id)?;
                let mesh = ops::linear_pattern(mesh, &p.direction, count(p.count), p.spacing)?;
                Ok(Outcome::update(&p.source_id, mesh, SpecChange::Clear))
            }

            OperationKind::CircularPattern(p) => {
                let (mesh, _) = source(graph, &p.source_id)?;
                let mesh =
                    ops::circular_pattern(mesh, &p.axis, &p.center, count(p.count), p.angle)?;
                Ok(Outcome::update(&p.source_id, mesh, SpecChange::Clear))
            }

            OperationKind::GridPattern(p) => {
                let (mesh, _) = source(graph, &p.source_id)?;
                let mesh = ops::grid_pattern(
                    mesh,
                    (&p.direction1, count(p.count1), p.spacing1),
                    (&p.direction2, count(p.count2), p.spacing2),
                )?;
                Ok(Outcome::update(&p.source_id, mesh, SpecChange::Clear))
            }

            OperationKind::SpiralPattern(p) => {
                let (mesh, _) = source(graph, &p.source_id)?;
                let mesh = ops::spiral_pattern(
                    mesh,
                    &Spiral {
                        axis: p.axis,
                        center: p.center,
                        count: count(p.count),
                        angle: p.angle,
                        pitch: p.pitch,
                        radius_growth: p.radius_growth,
                    },
                )?;
                Ok(Outcome::update(&p.source_id, mesh, SpecChange::Clear))
            }

            OperationKind::Mirror(p) => {
                let (mesh, _) = source(graph, &p.source_id)?;
                let mesh = ops::mirror(mesh, &p.normal, &p.point, p.keep_original)?;
                Ok(Outcome::update(&p.source_id, mesh, SpecChange::Clear))
            }

            OperationKind::Shell(p) => {
                let (mesh, primitive) = source(graph, &p.source_id)?;
                let open_top = p.open_faces.contains(&FaceDirection::Top);
                let open_bottom = p.open_faces.contains(&FaceDirection::Bottom);
                let (shelled, applied) = match primitive {
                    Some(Primitive::Box { size, center }) => (
                        ops::shell_box(size, center, p.thickness, &p.open_faces)?,
                        ops::shell::box_thickness(size, p.thickness),
                    ),
                    Some(Primitive::Cylinder {
                        radius,
                        height,
                        center,
                        segments,
                    }) => (
                        ops::shell_cylinder(
                            *radius,
                            *height,
                            center,
                            *segments,
                            p.thickness,
                            open_top,
                            open_bottom,
                        )?,
                        ops::shell::cylinder_thickness(*radius, *height, p.thickness),
                    ),
                    Some(Primitive::Sphere {
                        radius,
                        center,
                        segments,
                        rings,
                    }) => (
                        ops::shell_sphere(
                            *radius,
                            center,
                            *segments,
                            *rings,
                            p.thickness,
                            open_top,
                            open_bottom,
                            ops::shell::DEFAULT_OPENING_ANGLE,
                        )?,
                        ops::shell::sphere_thickness(*radius, p.thickness),
                    ),
                    _ => (ops::shell_mesh(mesh, p.thickness)?, p.thickness),
                };
                Ok(Outcome::update(&p.source_id, shelled, SpecChange::Clear)
                    .with_notes(clamp_note("thickness", p.thickness, applied)))
            }

            OperationKind::Scale(p) => {
                let (mesh, primitive) = source(graph, &p.source_id)?;
                let pivot = p.center.unwrap_or_else(|| default_pivot(mesh));
                transformed(&p.source_id, mesh, primitive, TransformOp::Scale(p.factor, pivot))
            }

            OperationKind::Rotate(p) => {
                let (mesh, primitive) = source(graph, &p.source_id)?;
                let pivot = p.center.unwrap_or_else(|| default_pivot(mesh));
                transformed(
                    &p.source_id,
                    mesh,
                    primitive,
                    TransformOp::Rotate(p.axis, p.angle, pivot),
                )
            }

            OperationKind::Translate(p) => {
                let (mesh, primitive) = source(graph, &p.source_id)?;
                transformed(&p.source_id, mesh, primitive, TransformOp::Translate(p.offset))
            }

            OperationKind::Draft(p) => {
                let (mesh, _) = source(graph, &p.source_id)?;
                let drafted = ops::draft(mesh, p.angle, &p.direction, p.neutral)?;
                let note = clamp_note("angle", p.angle, drafted.applied_angle);
                Ok(Outcome::update(&p.source_id, drafted.mesh, SpecChange::Clear).with_notes(note))
            }
        }
    }
}

fn transformed(
    id: &str,
    mesh: &Mesh,
    primitive: Option<&Primitive>,
    op: TransformOp,
) -> Result<Outcome, Failure> {
    let mut result = mesh.clone();
    transform::apply(&mut result, &op)?;
    let spec = match primitive.and_then(|p| ops::transform_primitive(p, &op)) {
        Some(p) => SpecChange::Set(p),
        None => SpecChange::Clear,
    };
    Ok(Outcome::update(id, result, spec))
}

fn commit(graph: &mut ArtifactGraph, change: Change) {
    match change {
        Change::Create { node, hide } => {
            for id in &hide {
                graph.hide(id);
            }
            graph.insert_visible(node);
        }
        Change::Update { id, mesh, spec } => {
            if let Some(node) = graph.get_mut(&id) {
                node.geometry = Some(mesh);
                match spec {
                    SpecChange::Keep => {}
                    SpecChange::Set(primitive) => node.spec = Some(primitive),
                    SpecChange::Clear => node.spec = None,
                }
            }
        }
    }
}

/// Evaluate with a throwaway boolean backend
pub fn evaluate(spec: &Specification, config: &EngineConfig) -> Evaluation {
    let booleans = OnceLock::new();
    Evaluator::new(config, &booleans).evaluate(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        BooleanParams, ChamferParams, DraftParams, Entry, ExtrudeParams, FilletParams,
        LinearPatternParams, LoftParams, RotateParams, ScaleParams, ShellParams, TorusParams,
        TranslateParams,
    };
    use crate::geometry::BooleanKind;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    fn cube(id: &str, size: f64, x: f64, line: usize) -> Entry<Primitive> {
        Entry::new(
            id,
            Primitive::cube(Vector3::repeat(size), Point3::new(x, 0.0, 0.0)),
        )
        .at_line(line)
    }

    fn fillet(source: &str, edges: EdgeSelector, radius: f64) -> Entry<FilletParams> {
        Entry::new(
            format!("{source}_fillet"),
            FilletParams {
                source_id: source.into(),
                edges,
                radius,
                segments: None,
            },
        )
    }

    fn run(spec: &Specification) -> Evaluation {
        evaluate(spec, &EngineConfig::default())
    }

    fn kinds(evaluation: &Evaluation) -> Vec<&DiagnosticKind> {
        evaluation.diagnostics.iter().map(|d| &d.kind).collect()
    }

    #[test]
    fn test_fillet_rewrites_source_in_place() {
        let mut spec = Specification::new();
        spec.primitives.push(cube("box1", 2.0, 0.0, 1));
        spec.fillet.push(fillet("box1", EdgeSelector::Index(0), 0.3));

        let evaluation = run(&spec);
        assert!(evaluation.diagnostics.is_empty());
        assert_eq!(evaluation.graph.artifacts, ["box1"]);
        let mesh = evaluation.graph.mesh("box1").unwrap();
        assert!(mesh.vertex_count() > 8);
        assert!(!mesh.has_non_finite());
        for p in mesh.vertices() {
            assert!(p.coords.iter().all(|c| (-1.1..=1.1).contains(c)));
        }
        assert!(!evaluation.graph.contains("box1_fillet"));
    }

    #[test]
    fn test_extrude_updates_dimensions_for_later_entries() {
        let mut spec = Specification::new();
        spec.primitives.push(cube("b", 2.0, 0.0, 1));
        spec.extrude.push(Entry::new(
            "b_extrude",
            ExtrudeParams {
                source_id: "b".into(),
                face: FaceDirection::Top,
                distance: 2.0,
            },
        ));
        spec.chamfer.push(Entry::new(
            "b_chamfer",
            ChamferParams {
                source_id: "b".into(),
                edges: EdgeSelector::All,
                distance: 0.1,
            },
        ));

        let evaluation = run(&spec);
        assert!(evaluation.diagnostics.is_empty());
        let node = evaluation.graph.get("b").unwrap();
        assert_eq!(
            node.spec,
            Some(Primitive::cube(
                Vector3::new(2.0, 4.0, 2.0),
                Point3::new(0.0, 1.0, 0.0)
            ))
        );
        let bbox = node.geometry.as_ref().unwrap().bounding_box();
        assert_relative_eq!(bbox.max.y, 3.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.min.y, -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_clamps_and_edge_index_are_reported() {
        let mut spec = Specification::new();
        spec.primitives.push(cube("box1", 2.0, 0.0, 1));
        spec.fillet.push(fillet("box1", EdgeSelector::Index(42), 5.0).at_line(2));

        let evaluation = run(&spec);
        assert!(!evaluation.has_errors());
        assert_eq!(
            kinds(&evaluation),
            [
                &DiagnosticKind::EdgeIndexOutOfRange { index: 42 },
                &DiagnosticKind::DegenerateParameterClamp {
                    parameter: "radius".into(),
                    requested: 5.0,
                    applied: 0.9,
                },
            ]
        );
        assert!(evaluation.diagnostics.iter().all(|d| d.line == Some(2)));
        assert!(!evaluation.graph.mesh("box1").unwrap().has_non_finite());
    }

    #[test]
    fn test_union_hides_sources() {
        let mut spec = Specification::new();
        spec.primitives.push(cube("a", 2.0, 0.0, 1));
        spec.primitives.push(cube("b", 2.0, 1.0, 2));
        spec.boolean.push(Entry::new(
            "u",
            BooleanParams {
                operation: BooleanKind::Union,
                source_a_id: "a".into(),
                source_b_id: "b".into(),
            },
        ));

        let evaluation = run(&spec);
        assert_eq!(evaluation.graph.artifacts, ["u"]);
        assert!(evaluation.graph.contains("a"));
        let bbox = evaluation.graph.mesh("u").unwrap().bounding_box();
        assert_relative_eq!(bbox.min.x, -1.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.max.x, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_and_forward_references() {
        let mut spec = Specification::new();
        spec.linear_pattern.push(
            Entry::new(
                "t_linear_pattern",
                LinearPatternParams {
                    source_id: "t".into(),
                    direction: Vector3::x(),
                    count: 2,
                    spacing: 5.0,
                },
            )
            .at_line(2),
        );
        spec.torus.push(
            Entry::new(
                "t",
                TorusParams {
                    major_radius: 2.0,
                    minor_radius: 0.5,
                    center: Point3::origin(),
                    segments: Some(12),
                    tube_segments: Some(8),
                },
            )
            .at_line(1),
        );
        spec.translate.push(Entry::new(
            "ghost_translate",
            TranslateParams {
                source_id: "ghost".into(),
                offset: Vector3::x(),
            },
        ));

        let evaluation = run(&spec);
        assert_eq!(
            kinds(&evaluation),
            [
                &DiagnosticKind::MissingReference {
                    reference: "t".into(),
                    forward: true
                },
                &DiagnosticKind::MissingReference {
                    reference: "ghost".into(),
                    forward: false
                },
            ]
        );
        assert_eq!(evaluation.graph.mesh("t").unwrap().vertex_count(), 12 * 8);

        let config = EngineConfig {
            order: EvaluationOrder::Dependency,
            ..EngineConfig::default()
        };
        let evaluation = evaluate(&spec, &config);
        assert_eq!(evaluation.diagnostics.len(), 1);
        assert_eq!(evaluation.graph.mesh("t").unwrap().vertex_count(), 2 * 12 * 8);
    }

    #[test]
    fn test_failures_are_contained() {
        let mut spec = Specification::new();
        spec.primitives.push(cube("a", 1.0, 0.0, 1));
        spec.primitives.push(Entry::new(
            "bad",
            Primitive::sphere(f64::NAN, Point3::origin()),
        ));
        spec.fillet.push(fillet("a", EdgeSelector::All, 0.1));
        spec.rotate.push(Entry::new(
            "a_rotate",
            RotateParams {
                source_id: "a".into(),
                axis: Vector3::zeros(),
                angle: 45.0,
                center: None,
            },
        ));
        spec.translate.push(Entry::new(
            "a_translate",
            TranslateParams {
                source_id: "a".into(),
                offset: Vector3::new(0.0, 5.0, 0.0),
            },
        ));

        let evaluation = run(&spec);
        assert_eq!(
            kinds(&evaluation),
            [&DiagnosticKind::OperatorFailure, &DiagnosticKind::OperatorFailure]
        );
        assert!(evaluation.has_errors());
        assert!(!evaluation.graph.contains("bad"));
        // The failed rotate left the filleted, translated box in place
        let bbox = evaluation.graph.mesh("a").unwrap().bounding_box();
        assert_relative_eq!(bbox.center().y, 5.0, epsilon = 1e-9);
        assert_eq!(
            evaluation.graph.get("a").unwrap().spec,
            Some(Primitive::cube(Vector3::repeat(1.0), Point3::new(0.0, 5.0, 0.0)))
        );
    }

    #[test]
    fn test_edge_ops_need_a_box() {
        let mut spec = Specification::new();
        spec.primitives.push(Entry::new(
            "c",
            Primitive::cylinder(1.0, 2.0, Point3::origin()),
        ));
        spec.fillet.push(fillet("c", EdgeSelector::Index(0), 0.2));

        let evaluation = run(&spec);
        assert_eq!(kinds(&evaluation), [&DiagnosticKind::UnsupportedTarget]);
        assert_eq!(
            evaluation.graph.mesh("c"),
            Some(&Primitive::cylinder(1.0, 2.0, Point3::origin()).to_mesh())
        );
    }

    #[test]
    fn test_shell_and_scale_back_references() {
        let mut spec = Specification::new();
        spec.primitives.push(cube("s", 2.0, 0.0, 1));
        spec.primitives.push(cube("k", 2.0, 5.0, 2));
        spec.shell.push(Entry::new(
            "s_shell",
            ShellParams {
                source_id: "s".into(),
                thickness: 3.0,
                open_faces: vec![FaceDirection::Top],
            },
        ));
        spec.scale.push(Entry::new(
            "k_scale",
            ScaleParams {
                source_id: "k".into(),
                factor: Vector3::new(2.0, 1.0, 1.0),
                center: None,
            },
        ));

        let evaluation = run(&spec);
        assert_eq!(
            kinds(&evaluation),
            [&DiagnosticKind::DegenerateParameterClamp {
                parameter: "thickness".into(),
                requested: 3.0,
                applied: 0.9,
            }]
        );
        assert_eq!(evaluation.graph.get("s").unwrap().spec, None);
        assert_eq!(
            evaluation.graph.get("k").unwrap().spec,
            Some(Primitive::cube(Vector3::new(4.0, 2.0, 2.0), Point3::new(5.0, 0.0, 0.0)))
        );
    }

    #[test]
    fn test_second_edge_treatment_reports_rebuild() {
        let mut spec = Specification::new();
        spec.primitives.push(cube("b", 2.0, 0.0, 1));
        spec.fillet.push(fillet("b", EdgeSelector::Index(0), 0.3).at_line(2));
        for (n, line) in [(1, 3), (2, 4)] {
            spec.chamfer.push(
                Entry::new(
                    format!("b_chamfer_{n}"),
                    ChamferParams {
                        source_id: "b".into(),
                        edges: EdgeSelector::Index(4),
                        distance: 0.2,
                    },
                )
                .at_line(line),
            );
        }

        let evaluation = run(&spec);
        assert_eq!(
            kinds(&evaluation),
            [
                &DiagnosticKind::RebuiltFromPrimitive {
                    discarded: "fillet".into()
                },
                &DiagnosticKind::RebuiltFromPrimitive {
                    discarded: "chamfer".into()
                },
            ]
        );
        let first = &evaluation.diagnostics[0];
        assert_eq!(first.severity, crate::ast::Severity::Info);
        assert_eq!(first.entry.as_deref(), Some("b_chamfer_1"));
        assert_eq!(first.line, Some(3));
        assert!(first.message.contains("fillet"));
        assert!(!evaluation.has_errors());
    }

    #[test]
    fn test_degenerate_torus_and_loft_report_clamps() {
        let mut spec = Specification::new();
        spec.torus.push(Entry::new(
            "t",
            TorusParams {
                major_radius: 0.0,
                minor_radius: 0.0,
                center: Point3::origin(),
                segments: Some(12),
                tube_segments: Some(8),
            },
        ));
        let square = vec![
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, -1.0),
            Point2::new(1.0, 1.0),
            Point2::new(-1.0, 1.0),
        ];
        spec.loft.push(Entry::new(
            "l",
            LoftParams {
                sections: vec![square.clone(), square],
                heights: vec![1.0, 1.0],
            },
        ));

        let evaluation = run(&spec);
        let clamps: Vec<(&str, &str, f64, f64)> = evaluation
            .diagnostics
            .iter()
            .filter_map(|d| match &d.kind {
                DiagnosticKind::DegenerateParameterClamp {
                    parameter,
                    requested,
                    applied,
                } => Some((
                    d.entry.as_deref().unwrap_or_default(),
                    parameter.as_str(),
                    *requested,
                    *applied,
                )),
                _ => None,
            })
            .collect();
        assert_eq!(clamps.len(), 3, "{:?}", evaluation.diagnostics);
        let tube = crate::geometry::primitives::MIN_TUBE_RADIUS;
        assert!(clamps.contains(&("t", "minor_radius", 0.0, tube)));
        assert!(clamps.contains(&("t", "major_radius", 0.0, tube)));
        assert!(clamps
            .iter()
            .any(|&(id, parameter, requested, applied)| id == "l"
                && parameter == "heights[1]"
                && requested == 1.0
                && applied > 1.0));

        for id in ["t", "l"] {
            assert!(evaluation.graph.mesh(id).unwrap().signed_volume() > 0.0);
        }
    }

    #[test]
    fn test_steep_draft_reports_applied_angle() {
        let mut spec = Specification::new();
        spec.primitives.push(cube("d", 2.0, 0.0, 1));
        spec.draft.push(Entry::new(
            "d_draft",
            DraftParams {
                source_id: "d".into(),
                angle: 80.0,
                direction: Vector3::y(),
                neutral: None,
            },
        ));

        let evaluation = run(&spec);
        match kinds(&evaluation).as_slice() {
            [DiagnosticKind::DegenerateParameterClamp {
                parameter,
                requested,
                applied,
            }] => {
                assert_eq!(parameter.as_str(), "angle");
                assert_eq!(*requested, 80.0);
                // A 2x2x2 box: tan(applied) * 2 / sqrt(2) == 1 - MIN_TAPER
                let limit = ((1.0 - ops::draft::MIN_TAPER) / 2f64.sqrt()).atan().to_degrees();
                assert!((applied - limit).abs() < 1e-9);
            }
            other => panic!("unexpected diagnostics {other:?}"),
        }
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let mut spec = Specification::new();
        spec.primitives.push(cube("a", 2.0, 0.0, 1));
        spec.primitives.push(cube("b", 1.0, 0.5, 2));
        spec.boolean.push(Entry::new(
            "cut",
            BooleanParams {
                operation: BooleanKind::Subtract,
                source_a_id: "a".into(),
                source_b_id: "b".into(),
            },
        ));
        assert_eq!(run(&spec), run(&spec));
    }
}
