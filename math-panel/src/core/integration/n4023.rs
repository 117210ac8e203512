//! Closed-form influence of a uniform source or doublet quadrilateral
//!
//! Edge-summation formulas of NASA TN-4023 (Johnson, 1980). All results are
//! scaled by 4π (the `1/4π` of the Green function is left to the caller,
//! matching the convention of the influence matrix).
//!
//! Beyond `far_field_ratio × max_size` from the collocation point the panel
//! is replaced by a point source (`O(1/r)` potential) or a point doublet
//! (`O(1/r³)` velocity), which avoids cancellation between nearly equal edge
//! terms and is much cheaper.

use crate::core::constants::{INPLANE_PRECISION, PI2, PI4};
use crate::core::integration::vortex::vortex_segment_velocity;
use crate::core::mesh::Panel;
use crate::core::types::Vector3;
use std::f64::consts::PI;

/// Per-edge quantities shared by the source and doublet formulas
struct EdgeTerms {
    a: Vector3,
    b: Vector3,
    s: Vector3,
    h: Vector3,
    a_len: f64,
    b_len: f64,
    s_len: f64,
    sm: f64,
    sl: f64,
    al: f64,
    pa: f64,
    pb: f64,
}

impl EdgeTerms {
    fn new(panel: &Panel, c: &Vector3, i: usize, pn: f64) -> Self {
        let ni = panel.nodes()[i];
        let nj = panel.nodes()[(i + 1) % 4];
        let a = *c - ni;
        let b = *c - nj;
        let s = nj - ni;
        let sm = s.dot(&panel.m());
        let sl = s.dot(&panel.l());
        let am = a.dot(&panel.m());
        let al_ = a.dot(&panel.l());
        let al = am * sl - al_ * sm;
        let pa = pn * pn * sl + al * am;
        let pb = pa - al * sm;
        EdgeTerms {
            a,
            b,
            s,
            h: a.cross(&s),
            a_len: a.norm(),
            b_len: b.norm(),
            s_len: s.norm(),
            sm,
            sl,
            al,
            pa,
            pb,
        }
    }

    /// True when the field point projects inside the edge
    fn projects_inside(&self) -> bool {
        self.a.dot(&self.s) >= 0.0 && self.b.dot(&self.s) <= 0.0
    }

    /// Edge log term `(1/S) ln |(A+B+S)/(A+B-S)|`
    fn gl(&self) -> f64 {
        let den = self.a_len + self.b_len - self.s_len;
        if den.abs() > 0.0 {
            ((self.a_len + self.b_len + self.s_len) / den).abs().ln() / self.s_len
        } else {
            0.0
        }
    }

    /// Solid-angle contribution of the edge
    fn cjk(&self, normal: &Vector3, pn: f64) -> f64 {
        let rnum = self.sm * pn * (self.b_len * self.pa - self.a_len * self.pb);
        let dnom = self.pa * self.pb + pn * pn * self.a_len * self.b_len * self.sm * self.sm;

        if pn.abs() < INPLANE_PRECISION {
            // Field point in the panel plane: the strip test decides
            let sign = if normal.dot(&self.h) >= 0.0 { 1.0 } else { -1.0 };
            let side = if pn > 0.0 { 1.0 } else { -1.0 };
            if dnom < 0.0 {
                PI * sign * side
            } else if dnom == 0.0 {
                PI / 2.0 * sign * side
            } else {
                0.0
            }
        } else {
            rnum.atan2(dnom)
        }
    }
}

impl Panel {
    /// Distance test for the far-field switch
    #[inline]
    fn in_far_field(&self, pjk: f64, far_field_ratio: Option<f64>) -> bool {
        far_field_ratio.is_some_and(|rff| pjk > rff * self.max_size())
    }

    /// Potential at `c` of a unit uniform source density on the panel
    ///
    /// Edges the point sits on (within `core_radius`) contribute nothing.
    pub fn source_potential(&self, c: &Vector3, core_radius: f64, far_field_ratio: Option<f64>) -> f64 {
        let pjk = *c - self.cog();
        let pn = pjk.dot(&self.normal());
        let r = pjk.norm();

        if self.in_far_field(r, far_field_ratio) {
            return -self.area() / r;
        }

        let normal = self.normal();
        let mut phi = 0.0;
        for i in 0..4 {
            if self.is_collapsed_edge(i) {
                continue;
            }
            let e = EdgeTerms::new(self, c, i, pn);
            if e.h.norm_sqr() / e.s.norm_sqr() <= core_radius * core_radius && e.projects_inside()
            {
                continue;
            }
            phi += e.al * e.gl() - pn * e.cjk(&normal, pn);
        }
        -phi
    }

    /// Velocity at `c` induced by a unit uniform source density on the panel
    ///
    /// `is_self` returns the exterior limit `2π·n` on the panel itself.
    pub fn source_velocity(
        &self,
        c: &Vector3,
        is_self: bool,
        core_radius: f64,
        far_field_ratio: Option<f64>,
    ) -> Vector3 {
        if is_self {
            return self.normal() * PI2;
        }

        let pjk = *c - self.cog();
        let pn = pjk.dot(&self.normal());
        let r = pjk.norm();

        if self.in_far_field(r, far_field_ratio) {
            return pjk * (self.area() / (r * r * r));
        }

        let normal = self.normal();
        let mut v = Vector3::zero();
        for i in 0..4 {
            if self.is_collapsed_edge(i) {
                continue;
            }
            let e = EdgeTerms::new(self, c, i, pn);
            let on_edge = e.h.norm_sqr() / e.s.norm_sqr() <= core_radius * core_radius
                && e.projects_inside();
            if on_edge || e.a_len < core_radius || e.b_len < core_radius {
                continue;
            }
            let gl = e.gl();
            v += normal * e.cjk(&normal, pn) + self.l() * (e.sm * gl) - self.m() * (e.sl * gl);
        }
        v
    }

    /// True if the point sits on edge `e` or one of its vertices (doublet kernels)
    fn doublet_skips(e: &EdgeTerms, core_radius: f64) -> bool {
        e.a_len < core_radius
            || e.b_len < core_radius
            || (e.h.norm() < core_radius && e.projects_inside())
    }

    /// Potential at `c` of a unit uniform doublet density on the panel
    ///
    /// `is_self` returns the analytic jump `2π` at the collocation point.
    pub fn doublet_potential(
        &self,
        c: &Vector3,
        is_self: bool,
        core_radius: f64,
        far_field_ratio: Option<f64>,
    ) -> f64 {
        if is_self {
            return PI2;
        }

        let pjk = *c - self.cog();
        let pn = pjk.dot(&self.normal());
        let r = pjk.norm();

        if self.in_far_field(r, far_field_ratio) {
            return -pn * self.area() / (r * r * r);
        }

        let normal = self.normal();
        let mut phi = 0.0;
        for i in 0..4 {
            if self.is_collapsed_edge(i) {
                continue;
            }
            let e = EdgeTerms::new(self, c, i, pn);
            if Self::doublet_skips(&e, core_radius) {
                continue;
            }
            phi += e.cjk(&normal, pn);
        }
        -phi
    }

    /// Point-doublet velocity `(3 (r·n) r - r² n) A / r⁵`
    fn doublet_far_field_velocity(&self, pjk: &Vector3, r: f64) -> Vector3 {
        let pn = pjk.dot(&self.normal());
        let r5 = r * r * r * r * r;
        (*pjk * (3.0 * pn) - self.normal() * (r * r)) * (self.area() / r5)
    }

    /// Velocity at `c` induced by a unit uniform doublet density (edge sums)
    pub fn doublet_velocity(
        &self,
        c: &Vector3,
        core_radius: f64,
        far_field_ratio: Option<f64>,
    ) -> Vector3 {
        let pjk = *c - self.cog();
        let pn = pjk.dot(&self.normal());
        let r = pjk.norm();

        if self.in_far_field(r, far_field_ratio) {
            return self.doublet_far_field_velocity(&pjk, r);
        }

        let mut v = Vector3::zero();
        for i in 0..4 {
            if self.is_collapsed_edge(i) {
                continue;
            }
            let e = EdgeTerms::new(self, c, i, pn);
            if Self::doublet_skips(&e, core_radius) {
                continue;
            }
            let ab = e.a_len * e.b_len;
            let gl = (e.a_len + e.b_len) / (ab * (ab + e.a.dot(&e.b)));
            v += e.a.cross(&e.b) * gl;
        }
        v
    }

    /// Velocity of a unit uniform doublet through its equivalent vortex ring
    ///
    /// Same far field as [`doublet_velocity`](Self::doublet_velocity); the
    /// near field sums the four edge filaments of circulation 4π.
    pub fn vortex_ring_velocity(
        &self,
        c: &Vector3,
        core_radius: f64,
        far_field_ratio: Option<f64>,
    ) -> Vector3 {
        let pjk = *c - self.cog();
        let r = pjk.norm();

        if self.in_far_field(r, far_field_ratio) {
            return self.doublet_far_field_velocity(&pjk, r);
        }

        let v: Vector3 = (0..4)
            .map(|i| {
                let e = self.edge(i);
                vortex_segment_velocity(&e.a, &e.b, c, core_radius)
            })
            .sum();
        v * PI4
    }
}
