//! Everything that changes while the scene runs, owned in one place.
//!
//! [`SceneSession`] holds the scene graph, camera, animation state and asset
//! bookkeeping. The window handler passes it by `&mut` to the frame, resize
//! and asset callbacks; none of it touches the GPU directly, so the whole
//! per-frame behaviour is testable without a device.

use std::time::Duration;

use orrery_animation::{Easing, PeriodicTween, Spin};
use orrery_assets::{
    AssetKind, AssetRequest, AssetSource, AssetTarget, DecodedImage, EnvironmentImage, LoadOutcome,
    LoadState, LoadTracker, LoadedAsset,
};
use orrery_config::{Config, ORBITER_COUNT};
use orrery_render::{Camera, SurfaceResizeEvent, SurfaceWrapper, TextureError};
use orrery_scene::{MapSlot, MeshSlot, Scene};
use tracing::{info, warn};

/// Receives decoded images and turns them into GPU resources.
pub trait AssetSink {
    fn apply_map(&mut self, slot: MeshSlot, image: &DecodedImage) -> Result<(), TextureError>;
    fn apply_environment(&mut self, environment: &EnvironmentImage) -> Result<(), TextureError>;
}

/// Why a loaded asset could not be applied.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error("{target} cannot use {kind}")]
    Mismatch {
        target: AssetTarget,
        kind: &'static str,
    },
}

/// The mesh whose material a color map is applied to.
pub fn mesh_slot(target: AssetTarget) -> Option<MeshSlot> {
    match target {
        AssetTarget::Environment => None,
        AssetTarget::Backdrop => Some(MeshSlot::Backdrop),
        AssetTarget::Orbiter(i) => Some(MeshSlot::Orbiter(i)),
    }
}

pub struct SceneSession {
    pub scene: Scene,
    pub camera: Camera,
    surface: SurfaceWrapper,
    sphere_spin: Spin,
    backdrop_spin: Spin,
    group_tween: PeriodicTween,
    tracker: LoadTracker,
}

impl SceneSession {
    pub fn new(config: &Config, width: u32, height: u32, scale_factor: f64) -> Self {
        let surface = SurfaceWrapper::new(width, height, scale_factor);
        let scene = Scene::build(&config.scene);
        let camera = Camera::from_config(&config.camera, surface.aspect_ratio());

        let animation = &config.animation;
        let easing = animation.easing.parse::<Easing>().unwrap_or_else(|e| {
            warn!("{e}, falling back to {}", Easing::default());
            Easing::default()
        });
        let group_tween = PeriodicTween::new(
            Duration::from_millis(animation.tween_interval_ms),
            Duration::from_millis(animation.tween_duration_ms),
            animation.tween_step_degrees.to_radians(),
            easing,
        );

        Self {
            scene,
            camera,
            surface,
            sphere_spin: Spin::new(animation.sphere_spin_per_frame),
            backdrop_spin: Spin::new(animation.backdrop_spin_per_frame),
            group_tween,
            tracker: LoadTracker::new(),
        }
    }

    /// One load request per asset, registered as pending.
    pub fn asset_requests(&mut self, config: &Config) -> Vec<AssetRequest> {
        let root = &config.assets.root;
        let scene = &config.scene;

        let mut requests = vec![
            AssetRequest {
                target: AssetTarget::Environment,
                source: AssetSource::parse(&scene.environment, root),
                kind: AssetKind::Environment,
            },
            AssetRequest {
                target: AssetTarget::Backdrop,
                source: AssetSource::parse(&scene.backdrop_texture, root),
                kind: AssetKind::ColorMap { srgb: false },
            },
        ];
        requests.extend((0..ORBITER_COUNT).map(|i| AssetRequest {
            target: AssetTarget::Orbiter(i),
            source: AssetSource::parse(&scene.sphere_textures[i], root),
            kind: AssetKind::ColorMap { srgb: true },
        }));

        for request in &requests {
            self.tracker.track(request.target);
        }
        requests
    }

    /// Give up on a request that never reached the loader.
    pub fn abandon(&mut self, target: AssetTarget) {
        warn!("Not loading {target}; it keeps its initial appearance");
        self.tracker.mark_failed(target);
    }

    /// Per-frame update: fixed spins, then the group tween at `elapsed`.
    pub fn advance_frame(&mut self, elapsed: Duration) {
        for child in self.scene.orbiters.children.iter_mut() {
            self.sphere_spin.advance(&mut child.transform.rotation.y);
        }
        self.backdrop_spin
            .advance(&mut self.scene.backdrop.transform.rotation.y);

        let group = &mut self.scene.orbiters.transform.rotation.y;
        *group = self.group_tween.update(elapsed, *group);
    }

    /// Track a new physical window size and update the camera aspect.
    pub fn resize(&mut self, width: u32, height: u32) -> Option<SurfaceResizeEvent> {
        let event = self.surface.handle_resize(width, height)?;
        self.apply_resize(&event);
        Some(event)
    }

    /// Track a scale factor change together with the new physical size.
    pub fn rescale(
        &mut self,
        scale_factor: f64,
        width: u32,
        height: u32,
    ) -> Option<SurfaceResizeEvent> {
        let event = self
            .surface
            .handle_scale_factor_changed(scale_factor, width, height)?;
        self.apply_resize(&event);
        Some(event)
    }

    fn apply_resize(&mut self, event: &SurfaceResizeEvent) {
        let size = event.physical;
        self.camera
            .set_aspect_ratio(size.width as f32, size.height as f32);
    }

    /// Apply a finished load. Failures are logged and leave the target as it was.
    pub fn apply_outcome(&mut self, outcome: LoadOutcome, sink: &mut impl AssetSink) -> LoadState {
        let LoadOutcome {
            target,
            source,
            result,
            load_time_ms,
        } = outcome;

        let asset = match result {
            Ok(asset) => asset,
            Err(e) => {
                warn!("Failed to load {target} from {source}: {e}");
                self.tracker.mark_failed(target);
                return LoadState::Failed;
            }
        };

        if let Err(e) = self.apply_asset(target, &asset, sink) {
            warn!("Failed to apply {target} from {source}: {e}");
            self.tracker.mark_failed(target);
            return LoadState::Failed;
        }

        let (width, height) = asset.dimensions();
        info!("Applied {target} ({width}x{height}) from {source} in {load_time_ms} ms");
        self.tracker.mark_applied(target);
        if self.tracker.all_settled() {
            info!(
                "All assets settled: {} applied, {} failed",
                self.tracker.applied_count(),
                self.tracker.failed_count()
            );
        }
        LoadState::Applied
    }

    fn apply_asset(
        &mut self,
        target: AssetTarget,
        asset: &LoadedAsset,
        sink: &mut impl AssetSink,
    ) -> Result<(), ApplyError> {
        match (mesh_slot(target), asset) {
            (None, LoadedAsset::Environment(environment)) => {
                sink.apply_environment(environment)?;
                self.scene.environment = MapSlot::Loaded {
                    width: environment.radiance.width,
                    height: environment.radiance.height,
                };
                Ok(())
            }
            (Some(slot), LoadedAsset::Image(image)) => {
                let Some(mesh) = self.scene.mesh_mut(slot) else {
                    return Err(ApplyError::Mismatch {
                        target,
                        kind: "a color map",
                    });
                };
                sink.apply_map(slot, image)?;
                mesh.material.map = MapSlot::Loaded {
                    width: image.width,
                    height: image.height,
                };
                Ok(())
            }
            (None, LoadedAsset::Image(_)) => Err(ApplyError::Mismatch {
                target,
                kind: "a color map",
            }),
            (Some(_), LoadedAsset::Environment(_)) => Err(ApplyError::Mismatch {
                target,
                kind: "an environment",
            }),
        }
    }

    pub fn surface(&self) -> &SurfaceWrapper {
        &self.surface
    }

    pub fn tracker(&self) -> &LoadTracker {
        &self.tracker
    }

    pub fn group_tween(&self) -> &PeriodicTween {
        &self.group_tween
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use orrery_assets::{AssetError, ImagePixels};

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        maps: Vec<MeshSlot>,
        environments: usize,
        fail_uploads: bool,
    }

    impl AssetSink for RecordingSink {
        fn apply_map(&mut self, slot: MeshSlot, image: &DecodedImage) -> Result<(), TextureError> {
            if self.fail_uploads {
                return Err(TextureError::ZeroDimensions {
                    width: image.width,
                    height: 0,
                });
            }
            self.maps.push(slot);
            Ok(())
        }

        fn apply_environment(&mut self, _: &EnvironmentImage) -> Result<(), TextureError> {
            self.environments += 1;
            Ok(())
        }
    }

    fn session() -> SceneSession {
        SceneSession::new(&Config::default(), 1280, 720, 1.0)
    }

    fn image(width: u32, height: u32) -> DecodedImage {
        DecodedImage {
            width,
            height,
            pixels: ImagePixels::Rgba8(vec![255; (width * height * 4) as usize]),
            srgb: true,
        }
    }

    fn outcome(target: AssetTarget, result: Result<LoadedAsset, AssetError>) -> LoadOutcome {
        LoadOutcome {
            target,
            source: AssetSource::Path("test.png".into()),
            result,
            load_time_ms: 1,
        }
    }

    #[test]
    fn test_spin_accumulates_per_frame() {
        let mut session = session();
        let frames = 250;
        for i in 0..frames {
            // Keep the clock before the first tween firing.
            session.advance_frame(Duration::from_millis(i));
        }
        for child in &session.scene.orbiters.children {
            assert!((child.transform.rotation.y - frames as f32 * 0.001).abs() < 1e-4);
        }
        let backdrop = session.scene.backdrop.transform.rotation.y;
        assert!((backdrop - frames as f32 * 0.0001).abs() < 1e-5);
        assert_eq!(session.scene.orbiters.transform.rotation.y, 0.0);
    }

    #[test]
    fn test_spin_ignores_frame_timing() {
        let mut fast = session();
        let mut slow = session();
        for i in 0..100 {
            fast.advance_frame(Duration::from_millis(i));
            slow.advance_frame(Duration::from_millis(i * 30));
        }
        assert_eq!(
            fast.scene.orbiters.children[0].transform.rotation.y,
            slow.scene.orbiters.children[0].transform.rotation.y
        );
    }

    #[test]
    fn test_tween_cycle_turns_group_a_quarter() {
        let mut session = session();
        let before = session.scene.orbiters.transform;

        let mut t = 0;
        while t <= 3500 + 2000 {
            session.advance_frame(Duration::from_millis(t));
            t += 16;
        }
        session.advance_frame(Duration::from_millis(5600));

        let after = session.scene.orbiters.transform;
        assert!((after.rotation.y - FRAC_PI_2).abs() < 1e-5);
        assert_eq!(after.rotation.x, before.rotation.x);
        assert_eq!(after.rotation.z, before.rotation.z);
        assert_eq!(after.position, before.position);
        assert_eq!(after.scale, before.scale);
        assert_eq!(session.group_tween().firings(), 1);
    }

    #[test]
    fn test_tween_midway_uses_expo_in_out() {
        let mut session = session();
        session.advance_frame(Duration::from_millis(3500));
        session.advance_frame(Duration::from_millis(4500));
        let angle = session.scene.orbiters.transform.rotation.y;
        assert!((angle - FRAC_PI_2 * 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_resize_sets_aspect_only() {
        let mut session = session();
        let meshes_before: Vec<_> = session
            .scene
            .slots()
            .filter_map(|slot| session.scene.mesh(slot).map(|m| m.transform))
            .collect();

        let event = session.resize(800, 400).unwrap();
        assert_eq!((event.physical.width, event.physical.height), (800, 400));
        assert!((session.camera.aspect_ratio - 2.0).abs() < 1e-6);

        // Same size again is a no-op.
        assert!(session.resize(800, 400).is_none());

        let meshes_after: Vec<_> = session
            .scene
            .slots()
            .filter_map(|slot| session.scene.mesh(slot).map(|m| m.transform))
            .collect();
        assert_eq!(meshes_before, meshes_after);
    }

    #[test]
    fn test_zero_size_resize_clamps() {
        let mut session = session();
        session.resize(0, 0);
        assert_eq!(session.surface().physical_size().width, 1);
        assert!(session.camera.aspect_ratio.is_finite());
    }

    #[test]
    fn test_rescale_reports_scale_change() {
        let mut session = session();
        let event = session.rescale(2.0, 1280, 720).unwrap();
        assert_eq!(event.scale_factor, 2.0);
        assert_eq!(session.surface().logical_size(), (640.0, 360.0));
    }

    #[test]
    fn test_asset_requests_cover_every_target() {
        let mut session = session();
        let requests = session.asset_requests(&Config::default());
        assert_eq!(requests.len(), 2 + ORBITER_COUNT);
        assert!(requests[0].source.is_remote());
        assert_eq!(requests[1].kind, AssetKind::ColorMap { srgb: false });
        assert!(
            requests[2..]
                .iter()
                .all(|r| r.kind == AssetKind::ColorMap { srgb: true })
        );
        assert_eq!(session.tracker().pending_count(), requests.len());
    }

    #[test]
    fn test_apply_map_marks_material() {
        let mut session = session();
        session.asset_requests(&Config::default());
        let mut sink = RecordingSink::default();

        let state = session.apply_outcome(
            outcome(AssetTarget::Orbiter(1), Ok(LoadedAsset::Image(image(4, 2)))),
            &mut sink,
        );
        assert_eq!(state, LoadState::Applied);
        assert_eq!(sink.maps, vec![MeshSlot::Orbiter(1)]);
        assert_eq!(
            session.scene.orbiters.children[1].material.map,
            MapSlot::Loaded {
                width: 4,
                height: 2
            }
        );
        assert_eq!(
            session.tracker().state(AssetTarget::Orbiter(1)),
            Some(LoadState::Applied)
        );
    }

    #[test]
    fn test_failed_load_leaves_scene_untouched() {
        let mut session = session();
        session.asset_requests(&Config::default());
        let mut sink = RecordingSink::default();
        let before = session.scene.backdrop.material.clone();

        let err = AssetError::Status {
            url: "https://example.invalid/stars.jpg".into(),
            status: 404,
        };
        let state = session.apply_outcome(outcome(AssetTarget::Backdrop, Err(err)), &mut sink);
        assert_eq!(state, LoadState::Failed);
        assert!(sink.maps.is_empty());
        assert_eq!(session.scene.backdrop.material, before);
        assert_eq!(session.tracker().failed_count(), 1);
    }

    #[test]
    fn test_failed_upload_counts_as_failure() {
        let mut session = session();
        session.asset_requests(&Config::default());
        let mut sink = RecordingSink {
            fail_uploads: true,
            ..Default::default()
        };
        let state = session.apply_outcome(
            outcome(AssetTarget::Orbiter(0), Ok(LoadedAsset::Image(image(2, 2)))),
            &mut sink,
        );
        assert_eq!(state, LoadState::Failed);
        assert_eq!(
            session.scene.orbiters.children[0].material.map,
            MapSlot::Unloaded
        );
    }

    #[test]
    fn test_environment_enables_image_lighting() {
        let mut session = session();
        session.asset_requests(&Config::default());
        let mut sink = RecordingSink::default();
        assert_eq!(session.scene.lighting_uniform().environment[1], 0.0);

        let float = |w, h| DecodedImage {
            width: w,
            height: h,
            pixels: ImagePixels::Rgba32F(vec![1.0; (w * h * 4) as usize]),
            srgb: false,
        };
        let environment = LoadedAsset::Environment(EnvironmentImage {
            radiance: float(8, 4),
            irradiance: float(4, 2),
        });
        session.apply_outcome(outcome(AssetTarget::Environment, Ok(environment)), &mut sink);

        assert_eq!(sink.environments, 1);
        assert!(session.scene.environment.is_loaded());
        assert_eq!(session.scene.lighting_uniform().environment[1], 1.0);
    }

    #[test]
    fn test_abandoned_request_is_settled() {
        let mut session = session();
        let requests = session.asset_requests(&Config::default());
        for request in requests {
            session.abandon(request.target);
        }
        assert!(session.tracker().all_settled());
        assert_eq!(session.tracker().failed_count(), 2 + ORBITER_COUNT);
    }

    #[test]
    fn test_mismatched_asset_is_rejected() {
        let mut session = session();
        session.asset_requests(&Config::default());
        let mut sink = RecordingSink::default();
        let state = session.apply_outcome(
            outcome(AssetTarget::Environment, Ok(LoadedAsset::Image(image(2, 2)))),
            &mut sink,
        );
        assert_eq!(state, LoadState::Failed);
        assert!(!session.scene.environment.is_loaded());
    }
}
