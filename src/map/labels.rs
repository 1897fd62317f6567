use glam::DVec2;

/// Collision radius around each label, map units
pub const COLLIDE_RADIUS: f64 = 15.0;
/// Pull of each label back toward its marker
pub const ANCHOR_STRENGTH: f64 = 0.2;
/// Relaxation always runs exactly this many steps
pub const ITERATIONS: usize = 300;

const ALPHA_MIN: f64 = 0.001;
const VELOCITY_DECAY: f64 = 0.4;

/// Fixed-iteration force relaxation that spreads overlapping labels
/// while keeping each one near its marker.
#[derive(Clone, Copy, Debug)]
pub struct LabelLayout {
    pub collide_radius: f64,
    pub anchor_strength: f64,
    pub iterations: usize,
}

impl Default for LabelLayout {
    fn default() -> Self {
        Self {
            collide_radius: COLLIDE_RADIUS,
            anchor_strength: ANCHOR_STRENGTH,
            iterations: ITERATIONS,
        }
    }
}

struct Node {
    anchor: DVec2,
    position: DVec2,
    velocity: DVec2,
}

impl LabelLayout {
    /// Adjusted label positions, one per anchor, in the same order
    pub fn place(&self, anchors: &[DVec2]) -> Vec<DVec2> {
        let mut nodes: Vec<Node> = anchors
            .iter()
            .map(|&anchor| Node {
                anchor,
                position: anchor,
                velocity: DVec2::ZERO,
            })
            .collect();

        let alpha_decay = self.alpha_decay();
        let mut alpha = 1.0;

        for step in 0..self.iterations {
            alpha += (0.0 - alpha) * alpha_decay;

            self.collide(&mut nodes, step as u64);

            for node in &mut nodes {
                node.velocity += (node.anchor - node.position) * self.anchor_strength * alpha;
            }

            for node in &mut nodes {
                node.velocity *= 1.0 - VELOCITY_DECAY;
                node.position += node.velocity;
            }
        }

        nodes.into_iter().map(|n| n.position).collect()
    }

    /// Per-step decay that brings alpha from 1 to its floor in `iterations` steps
    fn alpha_decay(&self) -> f64 {
        1.0 - ALPHA_MIN.powf(1.0 / self.iterations.max(1) as f64)
    }

    /// Resolve pairwise overlaps using predicted positions
    fn collide(&self, nodes: &mut [Node], step: u64) {
        let ri = self.collide_radius;
        let rj = self.collide_radius;
        let min_dist = ri + rj;
        // Share of the push taken by `i`; equal radii split evenly
        let share = (rj * rj) / (ri * ri + rj * rj);

        for i in 0..nodes.len() {
            // Fixed for the whole pass over i's neighbours
            let predicted_i = nodes[i].position + nodes[i].velocity;
            for j in (i + 1)..nodes.len() {
                let predicted_j = nodes[j].position + nodes[j].velocity;
                let mut delta = predicted_i - predicted_j;
                let mut len_sq = delta.length_squared();
                if len_sq >= min_dist * min_dist {
                    continue;
                }

                if delta.x == 0.0 {
                    delta.x = jiggle(i as u64, j as u64, step, 0);
                    len_sq += delta.x * delta.x;
                }
                if delta.y == 0.0 {
                    delta.y = jiggle(i as u64, j as u64, step, 1);
                    len_sq += delta.y * delta.y;
                }

                let len = len_sq.sqrt();
                let push = delta * ((min_dist - len) / len);
                nodes[i].velocity += push * share;
                nodes[j].velocity -= push * (1.0 - share);
            }
        }
    }
}

/// Tiny deterministic offset for coincident labels
fn jiggle(i: u64, j: u64, step: u64, axis: u64) -> f64 {
    let mut x = i
        .wrapping_mul(2654435761)
        .wrapping_add(j.wrapping_mul(2246822519))
        .wrapping_add(step.wrapping_mul(0x9e3779b97f4a7c15))
        .wrapping_add(axis);
    // splitmix64 finalizer
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58476d1ce4e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d049bb133111eb);
    x ^= x >> 31;
    let unit = (x >> 11) as f64 / 9007199254740992.0;
    (unit - 0.5) * 1e-6
}
