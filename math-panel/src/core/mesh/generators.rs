//! Reference geometries for validation
//!
//! These are not a general mesher: they produce the small, structured
//! meshes the tests and the sweep binary need, with neighbours connected
//! and wake columns attached.
//!
//! Conventions: x is the chordwise (freestream) direction, y the span, z
//! up. Body normals point out of the body; wake panels share the
//! orientation of the upper surface.

use crate::core::mesh::panel::Panel;
use crate::core::mesh::panel_mesh::PanelMesh;
use crate::core::types::{SurfaceKind, Vector3};
use std::f64::consts::PI;

/// Build a panel and flip its left/right sides if its normal points against `outward`
fn oriented(la: Vector3, lb: Vector3, ta: Vector3, tb: Vector3, outward: &Vector3) -> Panel {
    let panel = Panel::new(la, lb, ta, tb);
    if panel.normal().dot(outward) < 0.0 {
        Panel::new(lb, la, tb, ta)
    } else {
        panel
    }
}

/// Cosine-clustered stations on `[0, 1]`, denser at both ends
fn cosine_stations(n: usize) -> Vec<f64> {
    (0..=n)
        .map(|i| 0.5 * (1.0 - (PI * i as f64 / n as f64).cos()))
        .collect()
}

/// Uniform stations on `[a, b]`
fn uniform_stations(a: f64, b: f64, n: usize) -> Vec<f64> {
    (0..=n).map(|j| a + (b - a) * j as f64 / n as f64).collect()
}

/// Flat wake column behind the trailing edge segment `y0..y1` at `x_te`
fn flat_wake_column(x_te: f64, y0: f64, y1: f64, length: f64, n: usize) -> Vec<Panel> {
    let n = n.max(1);
    (0..n)
        .map(|i| {
            let x0 = x_te + length * i as f64 / n as f64;
            let x1 = x_te + length * (i + 1) as f64 / n as f64;
            Panel::new(
                Vector3::new(x0, y0, 0.0),
                Vector3::new(x0, y1, 0.0),
                Vector3::new(x1, y0, 0.0),
                Vector3::new(x1, y1, 0.0),
            )
            .with_kind(SurfaceKind::Wake)
        })
        .collect()
}

/// Flat rectangular plate of thin-surface panels in the `z = 0` plane
///
/// `nx` chordwise and `ny` spanwise panels, with one wake column of
/// `n_wake` panels and length `wake_length` per spanwise strip.
pub fn flat_plate(
    chord: f64,
    span: f64,
    nx: usize,
    ny: usize,
    wake_length: f64,
    n_wake: usize,
) -> PanelMesh {
    let xs: Vec<f64> = cosine_stations(nx).iter().map(|t| t * chord).collect();
    let ys = uniform_stations(-span / 2.0, span / 2.0, ny);

    let mut panels = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let mut p = Panel::new(
                Vector3::new(xs[i], ys[j], 0.0),
                Vector3::new(xs[i], ys[j + 1], 0.0),
                Vector3::new(xs[i + 1], ys[j], 0.0),
                Vector3::new(xs[i + 1], ys[j + 1], 0.0),
            )
            .with_kind(SurfaceKind::Mid);
            p.leading = i == 0;
            panels.push(p);
        }
    }

    let mut mesh = PanelMesh::new(panels);
    for j in 0..ny {
        let trailing = j * nx + nx - 1;
        let column = flat_wake_column(chord, ys[j], ys[j + 1], wake_length, n_wake);
        mesh.add_wake_column(column, &[trailing]);
    }
    mesh.connect_neighbours();
    mesh
}

/// Half-thickness of a symmetric four-digit section with a closed trailing edge
fn naca_half_thickness(t: f64, thickness_ratio: f64) -> f64 {
    5.0 * thickness_ratio
        * (0.2969 * t.sqrt() - 0.1260 * t - 0.3516 * t * t + 0.2843 * t.powi(3)
            - 0.1036 * t.powi(4))
}

/// Thick rectangular wing with a symmetric section and closed tips
///
/// Top and bottom surfaces each get `nx` chordwise by `ny` spanwise
/// panels; both tips are closed with side panels. Every trailing top/bottom
/// pair sheds into one shared wake column.
pub fn rectangular_wing(
    chord: f64,
    span: f64,
    thickness_ratio: f64,
    nx: usize,
    ny: usize,
    wake_length: f64,
    n_wake: usize,
) -> PanelMesh {
    let ts = cosine_stations(nx);
    let xs: Vec<f64> = ts.iter().map(|t| t * chord).collect();
    let zs: Vec<f64> = ts
        .iter()
        .map(|&t| chord * naca_half_thickness(t, thickness_ratio))
        .collect();
    let ys = uniform_stations(-span / 2.0, span / 2.0, ny);

    let mut panels = Vec::new();
    let mut trailing_pairs = Vec::with_capacity(ny);

    for j in 0..ny {
        for (kind, side) in [(SurfaceKind::Top, 1.0), (SurfaceKind::Bot, -1.0)] {
            for i in 0..nx {
                let node = |ii: usize, jj: usize| Vector3::new(xs[ii], ys[jj], side * zs[ii]);
                let mut p = oriented(
                    node(i, j),
                    node(i, j + 1),
                    node(i + 1, j),
                    node(i + 1, j + 1),
                    &Vector3::new(0.0, 0.0, side),
                )
                .with_kind(kind);
                p.leading = i == 0;
                panels.push(p);
            }
        }
        let top_trailing = panels.len() - nx - 1;
        let bot_trailing = panels.len() - 1;
        trailing_pairs.push([top_trailing, bot_trailing]);
    }

    // Tip caps between the upper and lower contours
    for (y, outward) in [(ys[0], -1.0), (ys[ny], 1.0)] {
        for i in 0..nx {
            let p = oriented(
                Vector3::new(xs[i], y, zs[i]),
                Vector3::new(xs[i], y, -zs[i]),
                Vector3::new(xs[i + 1], y, zs[i + 1]),
                Vector3::new(xs[i + 1], y, -zs[i + 1]),
                &Vector3::new(0.0, outward, 0.0),
            )
            .with_kind(SurfaceKind::Side);
            panels.push(p);
        }
    }

    let mut mesh = PanelMesh::new(panels);
    for (j, pair) in trailing_pairs.iter().enumerate() {
        let column = flat_wake_column(chord, ys[j], ys[j + 1], wake_length, n_wake);
        mesh.add_wake_column(column, pair);
    }
    mesh.connect_neighbours();
    mesh
}

/// Closed ellipsoid of revolution about the x axis, without wake
///
/// Semi-axis `a` along x and `b` in the y-z plane; `n_lat` stations from
/// nose to tail and `n_lon` around the axis. The polar rows are triangles.
pub fn ellipsoid(a: f64, b: f64, n_lat: usize, n_lon: usize) -> PanelMesh {
    let node = |it: usize, ip: usize| {
        let theta = PI * it as f64 / n_lat as f64;
        let phi = 2.0 * PI * (ip % n_lon) as f64 / n_lon as f64;
        if it == 0 {
            Vector3::new(-a, 0.0, 0.0)
        } else if it == n_lat {
            Vector3::new(a, 0.0, 0.0)
        } else {
            Vector3::new(
                -a * theta.cos(),
                b * theta.sin() * phi.cos(),
                b * theta.sin() * phi.sin(),
            )
        }
    };

    let mut panels = Vec::with_capacity(n_lat * n_lon);
    for it in 0..n_lat {
        for ip in 0..n_lon {
            let la = node(it, ip);
            let lb = node(it, ip + 1);
            let ta = node(it + 1, ip);
            let tb = node(it + 1, ip + 1);
            let centre = (la + lb + ta + tb) / 4.0;
            let mut p = oriented(la, lb, ta, tb, &centre).with_kind(SurfaceKind::Fuse);
            p.leading = it == 0;
            panels.push(p);
        }
    }

    let mut mesh = PanelMesh::new(panels);
    mesh.connect_neighbours();
    mesh
}
