/// Seeded fracture generator — deterministic procedural crack geometry.
///
/// All randomness flows through one `SessionRng` established at
/// initialization; draws happen in a single fixed order per growth call, so
/// a given seed always produces the same geometry. Endpoints are append-only
/// and prior paths are never regenerated or cleared.
use tracing::warn;

use crate::core::rng::SessionRng;

/// Interaction counts at which the fracture stage steps up to 1..=4.
pub const STAGE_THRESHOLDS: [u32; 4] = [15, 17, 19, 21];

/// The fracture stage reached at a given interaction count.
pub fn stage_for_interactions(count: u32) -> u32 {
    STAGE_THRESHOLDS.iter().filter(|&&t| count >= t).count() as u32
}

/// A point on the fracture canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// One crack branch: the polyline walked plus the stage it appeared at.
/// The stage gates visibility, nothing else.
#[derive(Debug, Clone)]
pub struct BranchPath {
    pub points: Vec<Point>,
    pub stage: u32,
}

/// Per-stage growth parameters. Step count, segment length, and turn
/// jitter all scale up with the stage.
#[derive(Debug, Clone, Copy)]
struct GrowthParams {
    paths: usize,
    steps: usize,
    step_len: f32,
    jitter: f32,
}

const SEED_PATH_COUNT: usize = 6;
const ANCHOR_JITTER: f32 = 4.0;

fn params_for(stage: u32) -> GrowthParams {
    match stage {
        0 => GrowthParams {
            paths: SEED_PATH_COUNT,
            steps: 3,
            step_len: 26.0,
            jitter: 0.90,
        },
        1 => GrowthParams {
            paths: 3,
            steps: 3,
            step_len: 28.0,
            jitter: 1.10,
        },
        2 => GrowthParams {
            paths: 4,
            steps: 4,
            step_len: 34.0,
            jitter: 1.25,
        },
        3 => GrowthParams {
            paths: 6,
            steps: 5,
            step_len: 42.0,
            jitter: 1.40,
        },
        _ => GrowthParams {
            paths: 8,
            steps: 6,
            step_len: 52.0,
            jitter: 1.60,
        },
    }
}

/// The growing crack graph for one run.
#[derive(Debug)]
pub struct FractureField {
    width: f32,
    height: f32,
    rng: Option<SessionRng>,
    endpoints: Vec<Point>,
    paths: Vec<BranchPath>,
    visual_stage: u32,
}

impl FractureField {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            rng: None,
            endpoints: Vec::new(),
            paths: Vec::new(),
            visual_stage: 0,
        }
    }

    /// Establish the run seed and emit the seed paths radiating from the
    /// canvas center. Idempotent: a seeded field ignores further calls.
    pub fn initialize(&mut self, seed: u64) {
        if self.rng.is_some() {
            return;
        }
        let mut rng = SessionRng::from_seed(seed);
        let params = params_for(0);
        let center = Point {
            x: self.width / 2.0,
            y: self.height / 2.0,
        };
        for _ in 0..params.paths {
            let points = walk(&mut rng, self.width, self.height, center, params);
            self.endpoints.push(points.last().copied().unwrap_or(center));
            self.paths.push(BranchPath { points, stage: 0 });
        }
        self.rng = Some(rng);
    }

    pub fn is_seeded(&self) -> bool {
        self.rng.is_some()
    }

    /// The seed this field was initialized with, once it is.
    pub fn seed(&self) -> Option<u64> {
        self.rng.as_ref().map(SessionRng::seed)
    }

    /// Append the branch paths for one fracture stage. Each path starts
    /// near a uniformly chosen existing endpoint and contributes its
    /// terminal point back as a new endpoint.
    pub fn grow_for_stage(&mut self, stage: u32) {
        let FractureField {
            rng,
            endpoints,
            paths,
            width,
            height,
            ..
        } = self;
        let Some(rng) = rng.as_mut() else {
            warn!(stage, "fracture growth requested before initialization");
            return;
        };
        let stage = stage.clamp(1, 4);
        let params = params_for(stage);
        for _ in 0..params.paths {
            let start = if endpoints.is_empty() {
                Point {
                    x: *width / 2.0,
                    y: *height / 2.0,
                }
            } else {
                let anchor = endpoints[rng.pick_index(endpoints.len())];
                Point {
                    x: (anchor.x + rng.range_f32(-ANCHOR_JITTER, ANCHOR_JITTER)).clamp(0.0, *width),
                    y: (anchor.y + rng.range_f32(-ANCHOR_JITTER, ANCHOR_JITTER))
                        .clamp(0.0, *height),
                }
            };
            let points = walk(rng, *width, *height, start, params);
            endpoints.push(points.last().copied().unwrap_or(start));
            paths.push(BranchPath { points, stage });
        }
    }

    /// Raise the visibility threshold. Presentational only: geometry is
    /// untouched and the stage never moves downward.
    pub fn set_visual_stage(&mut self, stage: u32) {
        self.visual_stage = self.visual_stage.max(stage.min(4));
    }

    pub fn visual_stage(&self) -> u32 {
        self.visual_stage
    }

    pub fn endpoints(&self) -> &[Point] {
        &self.endpoints
    }

    pub fn paths(&self) -> &[BranchPath] {
        &self.paths
    }

    /// Paths at or below the current visibility threshold.
    pub fn visible_paths(&self) -> impl Iterator<Item = &BranchPath> {
        self.paths
            .iter()
            .filter(|p| p.stage <= self.visual_stage)
    }
}

/// Walk one branch: random starting angle, per-segment angle perturbation
/// of ±jitter/2, segment length scaled by a uniform [0.75, 1.45] factor,
/// every point clamped into the canvas.
fn walk(
    rng: &mut SessionRng,
    width: f32,
    height: f32,
    start: Point,
    params: GrowthParams,
) -> Vec<Point> {
    let mut points = Vec::with_capacity(params.steps + 1);
    points.push(start);
    let mut angle = rng.range_f32(0.0, std::f32::consts::TAU);
    let mut pos = start;
    for _ in 0..params.steps {
        angle += (rng.next_f32() - 0.5) * params.jitter;
        let len = params.step_len * rng.range_f32(0.75, 1.45);
        pos = Point {
            x: (pos.x + angle.cos() * len).clamp(0.0, width),
            y: (pos.y + angle.sin() * len).clamp(0.0, height),
        };
        points.push(pos);
    }
    points
}
