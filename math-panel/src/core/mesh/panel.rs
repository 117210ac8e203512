//! Quadrilateral panel geometry
//!
//! A panel stores its four corners in the order `[LA, TA, TB, LB]`:
//!
//! ```text
//!     LA__________LB
//!     |           |
//!     |           |      | freestream
//!     |           |      v
//!     TA__________TB
//! ```
//!
//! Edge `i` runs from corner `i` to corner `i+1`: edge 0 is the left side
//! (LA→TA), edge 1 the trailing side (TA→TB), edge 2 the right side (TB→LB)
//! and edge 3 the leading side (LB→LA). Triangles are quads with one
//! collapsed edge.

use crate::core::constants::{
    COINCIDENT_TOLERANCE, DEFAULT_CTRL_POINT_FRACTION, DEFAULT_VORTEX_FRACTION,
};
use crate::core::types::{SurfaceKind, Vector3};

/// One straight edge of a panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Start vertex
    pub a: Vector3,
    /// End vertex
    pub b: Vector3,
}

impl Segment {
    /// Unit direction a→b (zero for a collapsed edge)
    pub fn unit_dir(&self) -> Vector3 {
        (self.b - self.a).normalized_or_zero()
    }

    /// Edge length
    pub fn length(&self) -> f64 {
        self.a.distance_to(&self.b)
    }

    /// Middle of the edge
    pub fn mid_point(&self) -> Vector3 {
        (self.a + self.b) * 0.5
    }
}

/// A flat quadrilateral (or triangular) panel with its local frame
///
/// The frame is fully derived from the corners; rigid transforms re-derive
/// it. Topology fields (`kind`, neighbours, wake links) are plain data owned
/// by the mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    nodes: [Vector3; 4],
    normal: Vector3,
    area: f64,
    cog: Vector3,
    ctrl_pt: Vector3,
    vortex_a: Vector3,
    vortex_b: Vector3,
    l: Vector3,
    m: Vector3,
    smp: f64,
    smq: f64,
    max_size: f64,
    ctrl_fraction: f64,
    vortex_fraction: f64,

    /// Surface the panel belongs to
    pub kind: SurfaceKind,
    /// First chordwise panel of its strip
    pub leading: bool,
    /// Last chordwise panel of its strip, sheds a wake
    pub trailing: bool,
    /// Neighbour across each edge (edge `i` joins corner `i` and `i+1`)
    pub neighbours: [Option<usize>; 4],
    /// First wake panel shed by a trailing body panel
    pub wake: Option<usize>,
    /// Wake column shed by a trailing body panel
    pub wake_column: Option<usize>,
    /// Next wake panel downstream (wake panels only)
    pub downstream: Option<usize>,
}

impl Panel {
    /// Build a panel from its leading-left, leading-right, trailing-left and trailing-right corners
    pub fn new(la: Vector3, lb: Vector3, ta: Vector3, tb: Vector3) -> Self {
        let mut panel = Panel {
            nodes: [la, ta, tb, lb],
            normal: Vector3::unit_z(),
            area: 0.0,
            cog: la,
            ctrl_pt: la,
            vortex_a: la,
            vortex_b: lb,
            l: Vector3::unit_x(),
            m: Vector3::unit_y(),
            smp: 0.0,
            smq: 0.0,
            max_size: 0.0,
            ctrl_fraction: DEFAULT_CTRL_POINT_FRACTION,
            vortex_fraction: DEFAULT_VORTEX_FRACTION,
            kind: SurfaceKind::default(),
            leading: false,
            trailing: false,
            neighbours: [None; 4],
            wake: None,
            wake_column: None,
            downstream: None,
        };
        panel.derive_frame();
        panel
    }

    /// Build a triangular panel `a → b → c` (LB collapses onto LA)
    pub fn triangle(a: Vector3, b: Vector3, c: Vector3) -> Self {
        Panel::new(a, a, b, c)
    }

    /// Set the surface classification
    pub fn with_kind(mut self, kind: SurfaceKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the chordwise fractions of the control point and bound vortex
    pub fn with_fractions(mut self, ctrl_fraction: f64, vortex_fraction: f64) -> Self {
        self.set_fractions(ctrl_fraction, vortex_fraction);
        self
    }

    /// In-place version of [`with_fractions`](Self::with_fractions)
    pub fn set_fractions(&mut self, ctrl_fraction: f64, vortex_fraction: f64) {
        self.ctrl_fraction = ctrl_fraction;
        self.vortex_fraction = vortex_fraction;
        self.derive_frame();
    }

    /// Replace the corners and re-derive the frame
    pub fn set_frame(&mut self, la: Vector3, lb: Vector3, ta: Vector3, tb: Vector3) {
        self.nodes = [la, ta, tb, lb];
        self.derive_frame();
    }

    fn derive_frame(&mut self) {
        let [la, ta, tb, lb] = self.nodes;

        let latb = tb - la;
        let talb = lb - ta;
        let cross = latb.cross(&talb);
        let cross_norm = cross.norm();
        self.area = cross_norm / 2.0;
        // All corners coincident (or a sliver): keep a safe arbitrary normal
        self.normal = if cross_norm > 0.0 {
            cross / cross_norm
        } else {
            Vector3::unit_z()
        };

        self.vortex_a = la.lerp(&ta, self.vortex_fraction);
        self.vortex_b = lb.lerp(&tb, self.vortex_fraction);
        let mid_a = la.lerp(&ta, self.ctrl_fraction);
        let mid_b = lb.lerp(&tb, self.ctrl_fraction);
        self.ctrl_pt = (mid_a + mid_b) * 0.5;

        // Average of the distinct corners
        let mut sum = la;
        let mut nv = 1.0;
        if !lb.is_same(&la, COINCIDENT_TOLERANCE) {
            sum += lb;
            nv += 1.0;
        }
        if !tb.is_same(&lb, COINCIDENT_TOLERANCE) {
            sum += tb;
            nv += 1.0;
        }
        if !ta.is_same(&tb, COINCIDENT_TOLERANCE) {
            sum += ta;
            nv += 1.0;
        }
        self.cog = sum / nv;

        let smq = (lb + tb) * 0.5 - self.cog;
        let smp = (tb + ta) * 0.5 - self.cog;
        self.smq = smq.norm();
        self.smp = smp.norm();
        self.max_size = self.smp.max(self.smq);

        self.m = match smq.normalized() {
            Some(m) => m,
            None => any_orthogonal(&self.normal),
        };
        self.l = self.m.cross(&self.normal);
    }

    /// Corners in edge order `[LA, TA, TB, LB]`
    pub fn nodes(&self) -> &[Vector3; 4] {
        &self.nodes
    }

    /// Leading-left corner
    pub fn la(&self) -> Vector3 {
        self.nodes[0]
    }

    /// Trailing-left corner
    pub fn ta(&self) -> Vector3 {
        self.nodes[1]
    }

    /// Trailing-right corner
    pub fn tb(&self) -> Vector3 {
        self.nodes[2]
    }

    /// Leading-right corner
    pub fn lb(&self) -> Vector3 {
        self.nodes[3]
    }

    /// Unit normal
    pub fn normal(&self) -> Vector3 {
        self.normal
    }

    /// Panel area
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Collocation point
    pub fn cog(&self) -> Vector3 {
        self.cog
    }

    /// Control point at the configured chordwise fraction
    pub fn ctrl_pt(&self) -> Vector3 {
        self.ctrl_pt
    }

    /// Left end of the bound vortex
    pub fn vortex_a(&self) -> Vector3 {
        self.vortex_a
    }

    /// Right end of the bound vortex
    pub fn vortex_b(&self) -> Vector3 {
        self.vortex_b
    }

    /// First in-plane unit vector
    pub fn l(&self) -> Vector3 {
        self.l
    }

    /// Second in-plane unit vector, towards the right edge
    pub fn m(&self) -> Vector3 {
        self.m
    }

    /// Half-extent towards the trailing edge
    pub fn smp(&self) -> f64 {
        self.smp
    }

    /// Half-extent towards the right edge
    pub fn smq(&self) -> f64 {
        self.smq
    }

    /// Characteristic size used by the far-field switch
    pub fn max_size(&self) -> f64 {
        self.max_size
    }

    /// Thin-surface panel
    pub fn is_mid(&self) -> bool {
        self.kind == SurfaceKind::Mid
    }

    /// Lower-surface panel
    pub fn is_bot(&self) -> bool {
        self.kind == SurfaceKind::Bot
    }

    /// Upper-surface panel
    pub fn is_top(&self) -> bool {
        self.kind == SurfaceKind::Top
    }

    /// Edge `i` (corner `i` to corner `i+1`)
    pub fn edge(&self, i: usize) -> Segment {
        Segment {
            a: self.nodes[i % 4],
            b: self.nodes[(i + 1) % 4],
        }
    }

    /// True if edge `i` has collapsed to a point
    pub fn is_collapsed_edge(&self, i: usize) -> bool {
        self.nodes[i % 4].is_same(&self.nodes[(i + 1) % 4], COINCIDENT_TOLERANCE)
    }

    /// Left chordwise edge LA→TA
    pub fn left_edge(&self) -> Segment {
        Segment {
            a: self.nodes[0],
            b: self.nodes[1],
        }
    }

    /// Right chordwise edge LB→TB
    pub fn right_edge(&self) -> Segment {
        Segment {
            a: self.nodes[3],
            b: self.nodes[2],
        }
    }

    /// Components of a global vector in the local frame `(l, m, n)`
    pub fn global_to_local(&self, v: &Vector3) -> Vector3 {
        Vector3::new(v.dot(&self.l), v.dot(&self.m), v.dot(&self.normal))
    }

    /// Global vector from its local components
    pub fn local_to_global(&self, v: &Vector3) -> Vector3 {
        self.l * v.x + self.m * v.y + self.normal * v.z
    }

    /// Local coordinates of a global point, origin at the collocation point
    pub fn global_to_local_position(&self, p: &Vector3) -> Vector3 {
        self.global_to_local(&(*p - self.cog))
    }

    /// Rigid translation
    pub fn translate(&mut self, t: &Vector3) {
        for node in self.nodes.iter_mut() {
            *node += *t;
        }
        self.derive_frame();
    }

    /// Rotation about the axis through `origin`, angle in radians
    pub fn rotate_about(&mut self, origin: &Vector3, axis: &Vector3, angle: f64) {
        for node in self.nodes.iter_mut() {
            *node = node.rotated_about(origin, axis, angle);
        }
        self.derive_frame();
    }

    /// Bank `phi` about x, then yaw `beta` about z, then pitch `alpha` about y
    ///
    /// Angles in degrees, rotations through the global origin.
    pub fn rotate_euler(&mut self, alpha: f64, beta: f64, phi: f64) {
        let origin = Vector3::zero();
        for node in self.nodes.iter_mut() {
            if phi.abs() > 0.0 {
                *node = node.rotated_about(&origin, &Vector3::unit_x(), phi.to_radians());
            }
            if beta.abs() > 0.0 {
                *node = node.rotated_about(&origin, &Vector3::unit_z(), beta.to_radians());
            }
            if alpha.abs() > 0.0 {
                *node = node.rotated_about(&origin, &Vector3::unit_y(), alpha.to_radians());
            }
        }
        self.derive_frame();
    }

    /// Minimum dihedral angle (degrees) between the two triangle pairs split on each diagonal
    ///
    /// 0 for a planar panel, and also returned when a split is degenerate.
    pub fn warp_angle(&self) -> f64 {
        let n = &self.nodes;
        let t0 = triangle_normal(&n[0], &n[1], &n[2]);
        let t1 = triangle_normal(&n[0], &n[2], &n[3]);
        let t2 = triangle_normal(&n[0], &n[1], &n[3]);
        let t3 = triangle_normal(&n[1], &n[2], &n[3]);
        match (t0, t1, t2, t3) {
            (Some(t0), Some(t1), Some(t2), Some(t3)) => {
                let a0 = t0.dot(&t1).clamp(-1.0, 1.0).acos().to_degrees().abs();
                let a1 = t2.dot(&t3).clamp(-1.0, 1.0).acos().to_degrees().abs();
                a0.min(a1)
            }
            _ => 0.0,
        }
    }

    /// Minimum internal corner angle in degrees
    pub fn min_angle(&self) -> f64 {
        let n = &self.nodes;
        (0..4)
            .filter_map(|i| {
                let prev = (n[(i + 3) % 4] - n[i]).normalized()?;
                let next = (n[(i + 1) % 4] - n[i]).normalized()?;
                Some(prev.dot(&next).clamp(-1.0, 1.0).acos().to_degrees().abs())
            })
            .fold(360.0, f64::min)
    }

    /// Mean spanwise width (measured in the y-z plane)
    pub fn width(&self) -> f64 {
        let yz = |a: Vector3, b: Vector3| ((b.y - a.y).powi(2) + (b.z - a.z).powi(2)).sqrt();
        (yz(self.la(), self.lb()) + yz(self.ta(), self.tb())) / 2.0
    }

    /// Mean chordwise length (measured in the x-z plane)
    pub fn length(&self) -> f64 {
        let xz = |a: Vector3, b: Vector3| ((b.x - a.x).powi(2) + (b.z - a.z).powi(2)).sqrt();
        (xz(self.la(), self.ta()) + xz(self.lb(), self.tb())) / 2.0
    }

    /// True if `p` lies within `core_radius` of one of the edges
    pub fn is_edge_point(&self, p: &Vector3, core_radius: f64) -> bool {
        (0..4).any(|i| {
            let edge = self.edge(i);
            let r0 = *p - edge.a;
            let r1 = *p - edge.b;
            if r0.dot(&r1) > 0.0 {
                return false;
            }
            let Some(u) = (edge.b - edge.a).normalized() else {
                return false;
            };
            let h = r0 - u * r0.dot(&u);
            h.norm() < core_radius
        })
    }
}

fn triangle_normal(a: &Vector3, b: &Vector3, c: &Vector3) -> Option<Vector3> {
    (*b - *a).cross(&(*c - *a)).normalized()
}

fn any_orthogonal(n: &Vector3) -> Vector3 {
    let trial = if n.x.abs() < 0.9 {
        Vector3::unit_x()
    } else {
        Vector3::unit_y()
    };
    n.cross(&trial).normalized_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> Panel {
        // Chord along +x, span along +y, normal +z
        Panel::new(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_frame_of_flat_square() {
        let p = unit_square();
        assert_relative_eq!(p.normal().z, 1.0, epsilon = 1e-14);
        assert_relative_eq!(p.area(), 1.0, epsilon = 1e-14);
        assert_relative_eq!(p.cog().x, 0.5, epsilon = 1e-14);
        assert_relative_eq!(p.cog().y, 0.5, epsilon = 1e-14);
        assert_relative_eq!(p.m().y, 1.0, epsilon = 1e-14);
        assert_relative_eq!(p.l().x, 1.0, epsilon = 1e-14);
        assert_relative_eq!(p.max_size(), 0.5, epsilon = 1e-14);
    }

    #[test]
    fn test_ctrl_point_between_leading_and_trailing_edges() {
        let p = unit_square();
        assert_relative_eq!(p.ctrl_pt().x, 0.75, epsilon = 1e-14);
        assert_relative_eq!(p.vortex_a().x, 0.25, epsilon = 1e-14);
        let p = p.with_fractions(0.6, 0.1);
        assert_relative_eq!(p.ctrl_pt().x, 0.6, epsilon = 1e-14);
        assert_relative_eq!(p.vortex_b().x, 0.1, epsilon = 1e-14);
    }

    #[test]
    fn test_triangle_cog_ignores_collapsed_corner() {
        let p = Panel::triangle(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(3.0, 0.0, 0.0),
            Vector3::new(0.0, 3.0, 0.0),
        );
        assert_relative_eq!(p.cog().x, 1.0, epsilon = 1e-14);
        assert_relative_eq!(p.cog().y, 1.0, epsilon = 1e-14);
        assert_relative_eq!(p.area(), 4.5, epsilon = 1e-12);
        assert_relative_eq!(p.normal().z, 1.0, epsilon = 1e-14);
        assert!(p.is_collapsed_edge(3));
    }

    #[test]
    fn test_fully_collapsed_panel_is_safe() {
        let o = Vector3::new(1.0, 1.0, 1.0);
        let p = Panel::new(o, o, o, o);
        assert_eq!(p.area(), 0.0);
        assert_relative_eq!(p.normal().norm(), 1.0, epsilon = 1e-14);
        assert!(p.normal().is_finite() && p.l().is_finite() && p.m().is_finite());
    }

    #[test]
    fn test_rotation_rederives_frame() {
        let mut p = unit_square();
        p.rotate_about(&Vector3::zero(), &Vector3::unit_x(), std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(p.normal().y, -1.0, epsilon = 1e-14);
        assert_relative_eq!(p.area(), 1.0, epsilon = 1e-14);

        p.translate(&Vector3::new(0.0, 0.0, 2.0));
        assert_relative_eq!(p.cog().z, 2.5, epsilon = 1e-14);
    }

    #[test]
    fn test_quality_metrics() {
        let p = unit_square();
        assert_relative_eq!(p.warp_angle(), 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.min_angle(), 90.0, epsilon = 1e-10);
        assert_relative_eq!(p.width(), 1.0, epsilon = 1e-14);
        assert_relative_eq!(p.length(), 1.0, epsilon = 1e-14);

        // Lift one corner: the panel is no longer planar
        let warped = Panel::new(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.3),
        );
        assert!(warped.warp_angle() > 1.0);
    }

    #[test]
    fn test_edge_point() {
        let p = unit_square();
        assert!(p.is_edge_point(&Vector3::new(0.5, 0.0, 1e-7), 1e-5));
        assert!(!p.is_edge_point(&Vector3::new(0.5, 0.5, 0.0), 1e-5));
    }

    #[test]
    fn test_local_global_roundtrip() {
        let p = Panel::new(
            Vector3::new(0.1, -0.2, 0.0),
            Vector3::new(0.0, 0.9, 0.3),
            Vector3::new(1.2, 0.0, 0.1),
            Vector3::new(1.0, 1.1, 0.4),
        );
        let v = Vector3::new(0.3, -1.2, 2.0);
        let back = p.local_to_global(&p.global_to_local(&v));
        assert_relative_eq!(back.x, v.x, epsilon = 1e-12);
        assert_relative_eq!(back.y, v.y, epsilon = 1e-12);
        assert_relative_eq!(back.z, v.z, epsilon = 1e-12);
    }
}
