// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CSG (Constructive Solid Geometry) operations using BSP tree
//!
//! Solids are polygon soups. Spanning polygons are split exactly against
//! each partitioning plane. The tree is stored in an arena and walked with
//! explicit stacks so deep trees (convex inputs produce chains) never
//! exhaust the call stack.

use nalgebra::{Point3, Vector3};

/// Plane-side tolerance
const EPSILON: f64 = 1e-5;

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

/// Polygon corner with a shading normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CsgVertex {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl CsgVertex {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self { position, normal }
    }

    fn flip(&mut self) {
        self.normal = -self.normal;
    }

    fn interpolate(&self, other: &CsgVertex, t: f64) -> CsgVertex {
        CsgVertex {
            position: self.position + (other.position - self.position) * t,
            normal: self.normal + (other.normal - self.normal) * t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Plane {
    normal: Vector3<f64>,
    w: f64,
}

impl Plane {
    fn from_points(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Option<Self> {
        let normal = (b - a).cross(&(c - a)).try_normalize(f64::EPSILON)?;
        Some(Self {
            normal,
            w: normal.dot(&a.coords),
        })
    }

    fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    fn classify(&self, point: &Point3<f64>) -> u8 {
        let t = self.normal.dot(&point.coords) - self.w;
        if t < -EPSILON {
            BACK
        } else if t > EPSILON {
            FRONT
        } else {
            COPLANAR
        }
    }

    /// Split `polygon` by this plane. Coplanar polygons go to one of the
    /// coplanar lists depending on orientation.
    fn split_polygon(
        &self,
        polygon: Polygon,
        coplanar_front: &mut Vec<Polygon>,
        coplanar_back: &mut Vec<Polygon>,
        front: &mut Vec<Polygon>,
        back: &mut Vec<Polygon>,
    ) {
        let types: Vec<u8> = polygon
            .vertices
            .iter()
            .map(|v| self.classify(&v.position))
            .collect();
        let polygon_type = types.iter().fold(COPLANAR, |acc, t| acc | t);

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(&polygon.plane.normal) > 0.0 {
                    coplanar_front.push(polygon);
                } else {
                    coplanar_back.push(polygon);
                }
            }
            FRONT => front.push(polygon),
            BACK => back.push(polygon),
            _ => {
                let n = polygon.vertices.len();
                let mut f = Vec::with_capacity(n + 1);
                let mut b = Vec::with_capacity(n + 1);
                for i in 0..n {
                    let j = (i + 1) % n;
                    let (ti, tj) = (types[i], types[j]);
                    let (vi, vj) = (&polygon.vertices[i], &polygon.vertices[j]);
                    if ti != BACK {
                        f.push(*vi);
                    }
                    if ti != FRONT {
                        b.push(*vi);
                    }
                    if (ti | tj) == SPANNING {
                        let t = (self.w - self.normal.dot(&vi.position.coords))
                            / self.normal.dot(&(vj.position - vi.position));
                        let v = vi.interpolate(vj, t);
                        f.push(v);
                        b.push(v);
                    }
                }
                if f.len() >= 3 {
                    front.push(Polygon {
                        vertices: f,
                        plane: polygon.plane,
                    });
                }
                if b.len() >= 3 {
                    back.push(Polygon {
                        vertices: b,
                        plane: polygon.plane,
                    });
                }
            }
        }
    }
}

/// Convex planar polygon
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<CsgVertex>,
    plane: Plane,
}

impl Polygon {
    /// `None` when the first three corners are collinear
    pub fn new(vertices: Vec<CsgVertex>) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        let plane = Plane::from_points(
            &vertices[0].position,
            &vertices[1].position,
            &vertices[2].position,
        )?;
        Some(Self { vertices, plane })
    }

    pub fn vertices(&self) -> &[CsgVertex] {
        &self.vertices
    }

    pub fn normal(&self) -> Vector3<f64> {
        self.plane.normal
    }

    fn flip(&mut self) {
        self.vertices.reverse();
        for v in &mut self.vertices {
            v.flip();
        }
        self.plane.flip();
    }
}

/// BSP tree node for CSG operations
#[derive(Debug, Clone, Default)]
struct BspNode {
    plane: Option<Plane>,
    front: Option<usize>,
    back: Option<usize>,
    polygons: Vec<Polygon>,
}

#[derive(Debug, Clone)]
struct BspTree {
    nodes: Vec<BspNode>,
}

impl BspTree {
    fn new(polygons: Vec<Polygon>) -> Self {
        let mut tree = Self {
            nodes: vec![BspNode::default()],
        };
        tree.build(polygons);
        tree
    }

    fn push_node(&mut self) -> usize {
        self.nodes.push(BspNode::default());
        self.nodes.len() - 1
    }

    /// Insert polygons, growing the tree as needed
    fn build(&mut self, polygons: Vec<Polygon>) {
        let mut stack = vec![(0usize, polygons)];
        while let Some((index, polygons)) = stack.pop() {
            if polygons.is_empty() {
                continue;
            }
            let plane = *self.nodes[index].plane.get_or_insert(polygons[0].plane);

            let mut coplanar = Vec::new();
            let mut coplanar_back = Vec::new();
            let mut front = Vec::new();
            let mut back = Vec::new();
            for polygon in polygons {
                plane.split_polygon(
                    polygon,
                    &mut coplanar,
                    &mut coplanar_back,
                    &mut front,
                    &mut back,
                );
            }
            coplanar.append(&mut coplanar_back);
            self.nodes[index].polygons.append(&mut coplanar);

            if !front.is_empty() {
                let child = match self.nodes[index].front {
                    Some(child) => child,
                    None => {
                        let child = self.push_node();
                        self.nodes[index].front = Some(child);
                        child
                    }
                };
                stack.push((child, front));
            }
            if !back.is_empty() {
                let child = match self.nodes[index].back {
                    Some(child) => child,
                    None => {
                        let child = self.push_node();
                        self.nodes[index].back = Some(child);
                        child
                    }
                };
                stack.push((child, back));
            }
        }
    }

    /// Remove the parts of `polygons` that lie inside this solid
    fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        let mut result = Vec::new();
        let mut stack = vec![(0usize, polygons)];
        while let Some((index, polygons)) = stack.pop() {
            let node = &self.nodes[index];
            let Some(plane) = node.plane else {
                result.extend(polygons);
                continue;
            };

            let mut front = Vec::new();
            let mut back = Vec::new();
            for polygon in polygons {
                // Coplanar pieces follow their orientation
                let mut coplanar_front = Vec::new();
                let mut coplanar_back = Vec::new();
                plane.split_polygon(
                    polygon,
                    &mut coplanar_front,
                    &mut coplanar_back,
                    &mut front,
                    &mut back,
                );
                front.append(&mut coplanar_front);
                back.append(&mut coplanar_back);
            }

            match node.front {
                Some(child) => stack.push((child, front)),
                None => result.extend(front),
            }
            if let Some(child) = node.back {
                stack.push((child, back));
            }
        }
        result
    }

    /// Clip every polygon in this tree against `other`
    fn clip_to(&mut self, other: &BspTree) {
        for node in &mut self.nodes {
            let polygons = std::mem::take(&mut node.polygons);
            node.polygons = other.clip_polygons(polygons);
        }
    }

    /// Swap solid space and empty space
    fn invert(&mut self) {
        for node in &mut self.nodes {
            for polygon in &mut node.polygons {
                polygon.flip();
            }
            if let Some(plane) = &mut node.plane {
                plane.flip();
            }
            std::mem::swap(&mut node.front, &mut node.back);
        }
    }

    fn all_polygons(&self) -> Vec<Polygon> {
        self.nodes
            .iter()
            .flat_map(|node| node.polygons.iter().cloned())
            .collect()
    }
}

/// A closed solid as a set of polygons
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Solid {
    polygons: Vec<Polygon>,
}

impl Solid {
    pub fn from_polygons(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn into_polygons(self) -> Vec<Polygon> {
        self.polygons
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Space occupied by either solid
    pub fn union(&self, other: &Solid) -> Solid {
        let mut a = BspTree::new(self.polygons.clone());
        let mut b = BspTree::new(other.polygons.clone());
        a.clip_to(&b);
        b.clip_to(&a);
        b.invert();
        b.clip_to(&a);
        b.invert();
        a.build(b.all_polygons());
        Solid::from_polygons(a.all_polygons())
    }

    /// Space occupied by this solid but not `other`
    pub fn subtract(&self, other: &Solid) -> Solid {
        let mut a = BspTree::new(self.polygons.clone());
        let mut b = BspTree::new(other.polygons.clone());
        a.invert();
        a.clip_to(&b);
        b.clip_to(&a);
        b.invert();
        b.clip_to(&a);
        b.invert();
        a.build(b.all_polygons());
        a.invert();
        Solid::from_polygons(a.all_polygons())
    }

    /// Space occupied by both solids
    pub fn intersect(&self, other: &Solid) -> Solid {
        let mut a = BspTree::new(self.polygons.clone());
        let mut b = BspTree::new(other.polygons.clone());
        a.invert();
        b.clip_to(&a);
        b.invert();
        a.clip_to(&b);
        b.clip_to(&a);
        a.build(b.all_polygons());
        a.invert();
        Solid::from_polygons(a.all_polygons())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(min: [f64; 3], max: [f64; 3]) -> Solid {
        let p = |x: usize, y: usize, z: usize| {
            Point3::new(
                if x == 0 { min[0] } else { max[0] },
                if y == 0 { min[1] } else { max[1] },
                if z == 0 { min[2] } else { max[2] },
            )
        };
        // Counter-clockwise seen from outside
        let faces: [([usize; 3], [usize; 3], [usize; 3], [usize; 3], Vector3<f64>); 6] = [
            ([0, 0, 0], [0, 0, 1], [0, 1, 1], [0, 1, 0], -Vector3::x()),
            ([1, 0, 0], [1, 1, 0], [1, 1, 1], [1, 0, 1], Vector3::x()),
            ([0, 0, 0], [1, 0, 0], [1, 0, 1], [0, 0, 1], -Vector3::y()),
            ([0, 1, 0], [0, 1, 1], [1, 1, 1], [1, 1, 0], Vector3::y()),
            ([0, 0, 0], [0, 1, 0], [1, 1, 0], [1, 0, 0], -Vector3::z()),
            ([0, 0, 1], [1, 0, 1], [1, 1, 1], [0, 1, 1], Vector3::z()),
        ];
        let polygons = faces
            .iter()
            .map(|(a, b, c, d, n)| {
                let verts = [a, b, c, d]
                    .iter()
                    .map(|i| CsgVertex::new(p(i[0], i[1], i[2]), *n))
                    .collect();
                Polygon::new(verts).unwrap()
            })
            .collect();
        Solid::from_polygons(polygons)
    }

    fn volume(solid: &Solid) -> f64 {
        solid
            .polygons()
            .iter()
            .map(|poly| {
                let v = poly.vertices();
                (1..v.len() - 1)
                    .map(|i| {
                        v[0].position
                            .coords
                            .dot(&v[i].position.coords.cross(&v[i + 1].position.coords))
                            / 6.0
                    })
                    .sum::<f64>()
            })
            .sum()
    }

    #[test]
    fn test_cube_fixture_is_outward() {
        assert!((volume(&cube([0.0; 3], [1.0; 3])) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_csg_union_of_overlapping_cubes() {
        let a = cube([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
        let b = cube([1.0, 1.0, 1.0], [3.0, 3.0, 3.0]);
        let u = a.union(&b);
        assert!((volume(&u) - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_csg_difference() {
        let a = cube([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
        let b = cube([1.0, 1.0, 1.0], [3.0, 3.0, 3.0]);
        let d = a.subtract(&b);
        assert!((volume(&d) - 7.0).abs() < 1e-6);
    }

    #[test]
    fn test_csg_intersection() {
        let a = cube([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
        let b = cube([1.0, 1.0, 1.0], [3.0, 3.0, 3.0]);
        let i = a.intersect(&b);
        assert!((volume(&i) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_disjoint_intersection_is_empty() {
        let a = cube([0.0; 3], [1.0; 3]);
        let b = cube([5.0; 3], [6.0; 3]);
        assert!(a.intersect(&b).is_empty());
        assert!((volume(&a.union(&b)) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_union_with_empty() {
        let a = cube([0.0; 3], [1.0; 3]);
        let u = a.union(&Solid::default());
        assert!((volume(&u) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_collinear_polygon_rejected() {
        let v = |x: f64| CsgVertex::new(Point3::new(x, 0.0, 0.0), Vector3::y());
        assert!(Polygon::new(vec![v(0.0), v(1.0), v(2.0)]).is_none());
    }
}
