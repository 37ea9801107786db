//! Frame → angle resolution with visibility gating

use pose_landmarks::schema::{
    LEFT_EAR, LEFT_HIP, LEFT_SHOULDER, RIGHT_EAR, RIGHT_HIP, RIGHT_SHOULDER,
};
use pose_landmarks::{FrameSize, LandmarkFrame, PoseResult, WorldFrame};
use rom_geometry::{
    cross, dot, midpoint, midpoint_3d, normalize, normalize_degrees, reject,
    signed_angle, signed_angle_between, subtract, Point2,
};
use tracing::trace;

use crate::recipe::{recipes_for, BodyPlane, Kernel, PointRef, Recipe, Reference};
use crate::{MeasurementConfig, ResolverConfig};

/// Depth weight applied to the nose-ear z offset in head yaw
const YAW_DEPTH_WEIGHT: f64 = 2.5;

/// Resolves measurement configurations against pose frames
#[derive(Debug, Clone, Default)]
pub struct JointResolver {
    config: ResolverConfig,
}

impl JointResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Angle in degrees for one measurement, or None when a required
    /// landmark is missing or not confidently visible
    pub fn resolve(&self, measurement: &MeasurementConfig, result: &PoseResult) -> Option<f64> {
        self.resolve_frame(
            measurement,
            &result.landmarks,
            result.size,
            result.world_landmarks.as_ref(),
        )
    }

    pub fn resolve_frame(
        &self,
        measurement: &MeasurementConfig,
        frame: &LandmarkFrame,
        size: FrameSize,
        world: Option<&WorldFrame>,
    ) -> Option<f64> {
        let recipes = recipes_for(
            measurement.joint(),
            measurement.direction(),
            measurement.side(),
        )?;

        let world = world.filter(|w| self.config.prefer_world_landmarks && !w.is_empty());
        if let (Some(recipe), Some(world)) = (recipes.world, world) {
            if let Some(angle) = self.evaluate_world(&recipe, frame, world) {
                return Some(angle);
            }
        }

        let angle = self.evaluate_image(&recipes.image, frame, size)?;
        trace!(
            "{} {} -> {:.1}",
            measurement.joint(),
            measurement.direction(),
            angle
        );
        Some(angle)
    }

    /// Every index exists and is visible above the threshold
    fn gate(&self, frame: &LandmarkFrame, indices: &[usize]) -> bool {
        indices.iter().all(|&idx| {
            frame
                .get(idx)
                .map_or(false, |lm| lm.visibility > self.config.visibility_threshold)
        })
    }

    fn evaluate_image(
        &self,
        recipe: &Recipe,
        frame: &LandmarkFrame,
        size: FrameSize,
    ) -> Option<f64> {
        if !self.gate(frame, &recipe.kernel.indices()) {
            return None;
        }
        let point = |p: PointRef| -> Option<Point2> {
            match p {
                PointRef::Landmark(idx) => Some(frame.get(idx)?.to_pixel(size)),
                PointRef::Midpoint(a, b) => Some(midpoint(
                    frame.get(a)?.to_pixel(size),
                    frame.get(b)?.to_pixel(size),
                )),
            }
        };

        let theta = match recipe.kernel {
            Kernel::Vertex { a, vertex, c } => {
                signed_angle(point(c)?, point(vertex)?, point(a)?)
            }
            Kernel::Segments {
                reference,
                from,
                to,
                facing,
            } => {
                let base = match reference {
                    Reference::Segment(p, q) => point(p)?.to(point(q)?),
                    Reference::VerticalUp => Point2::new(0.0, -1.0),
                };
                let theta = signed_angle_between(base, point(from)?.to(point(to)?));
                let facing_left = match facing {
                    Some((nose, ear)) => frame.get(nose)?.x < frame.get(ear)?.x,
                    None => false,
                };
                if facing_left {
                    -theta
                } else {
                    theta
                }
            }
            Kernel::HeadYaw {
                nose,
                left_ear,
                right_ear,
            } => {
                let nose = frame.get(nose)?;
                let (left, right) = (frame.get(left_ear)?, frame.get(right_ear)?);
                let dx = nose.x - (left.x + right.x) / 2.0;
                let dz = nose.z - (left.z + right.z) / 2.0;
                dx.atan2(-dz * YAW_DEPTH_WEIGHT).to_degrees()
            }
            // world-only kernel
            Kernel::TorsoPlane(_) => return None,
        };

        finite(recipe.readout.apply(theta))
    }

    fn evaluate_world(
        &self,
        recipe: &Recipe,
        frame: &LandmarkFrame,
        world: &WorldFrame,
    ) -> Option<f64> {
        let Kernel::TorsoPlane(plane) = recipe.kernel else {
            return None;
        };
        if !self.gate(frame, &recipe.kernel.indices()) {
            return None;
        }

        let left_shoulder = world.point(LEFT_SHOULDER)?;
        let right_shoulder = world.point(RIGHT_SHOULDER)?;
        let left_ear = world.point(LEFT_EAR)?;
        let right_ear = world.point(RIGHT_EAR)?;
        let shoulder_mid = midpoint_3d(left_shoulder, right_shoulder);
        let hip_mid = midpoint_3d(world.point(LEFT_HIP)?, world.point(RIGHT_HIP)?);
        let ear_mid = midpoint_3d(left_ear, right_ear);

        let up = normalize(subtract(hip_mid, shoulder_mid));
        let lateral = normalize(subtract(left_shoulder, right_shoulder));
        let forward = normalize(cross(lateral, up));
        let right = normalize(cross(up, forward));
        let neck = subtract(shoulder_mid, ear_mid);

        let theta = match plane {
            BodyPlane::Sagittal => {
                let n = reject(neck, right);
                dot(n, forward).atan2(dot(n, up))
            }
            BodyPlane::Coronal => {
                let n = reject(neck, forward);
                dot(n, right).atan2(dot(n, up))
            }
            BodyPlane::Transverse => {
                let t = reject(subtract(left_ear, right_ear), up);
                dot(t, forward).atan2(dot(t, right))
            }
        };

        finite(recipe.readout.apply(normalize_degrees(theta.to_degrees())))
    }
}

fn finite(angle: f64) -> Option<f64> {
    angle.is_finite().then_some(angle)
}
