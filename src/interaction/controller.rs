//! The interaction controller: pointer state, the drag/consume/respawn
//! phase machine, and the per-tick animation update.
//!
//! Event handlers (`on_pointer_move`, `on_press`, `on_release`) only update
//! controller state — targets, flags, phase transitions. The rig transform
//! written into the scene graph is produced in one place, [`tick`], from
//! that state, so there is a single authoritative write path per frame.
//!
//! Collaborators are injected: hit-testing through [`PickSurface`], time
//! through explicit `Instant`/delta parameters, and projection through a
//! [`Projection`] snapshot. The controller never touches the window or the
//! GPU, which keeps the whole machine testable headlessly.
//!
//! [`tick`]: InteractionController::tick

use std::f32::consts::PI;
use std::time::{Duration, Instant};

use cgmath::{ElementWise, InnerSpace, Matrix3, Matrix4, Rad, Vector2, Vector3, Zero};
use winit::window::CursorIcon;

use crate::gfx::camera::{Projection, POLAR_ANGLE};
use crate::interaction::timers::{ConsumeSchedule, CycleId, FiredTimer, TimerKind};
use crate::interaction::trash::{TrashGeometry, TrashVisual};
use crate::interaction::tween::{lerp_clamped, spin_rate};

/// Resting model pose, radians about +Y.
pub const DEFAULT_MODEL_ANGLE: f32 = 3.0 * PI / 4.0;
/// Resting uniform scale of the rig.
pub const DEFAULT_SCALE: f32 = 1.0;
/// Delay between a consume release and the visual settle.
pub const CONSUME_TIMEOUT: Duration = Duration::from_millis(500);
/// Delay between a consume release and the respawn.
pub const RESPAWN_TIMEOUT: Duration = Duration::from_millis(2000);

/// Rate of the scale tween, per second.
const SCALE_TRANSITION_SPEED: f32 = 5.0;
/// Decay rate of the spring that pulls the rig back to its origin.
const RETURN_SPEED: f32 = 5.0;
/// Pointer travel (in NDC) under which a release counts as a click.
const DRAG_DISTANCE_EPSILON: f32 = 0.001;
/// Distance from the origin at which a returning rig is considered home.
const SETTLE_EPSILON: f32 = 1.0e-3;

/// World-space hit testing seam. Implemented by the scene; tests substitute
/// a closure.
pub trait PickSurface {
    /// Casts the pointer ray for `ndc` and returns the closest world-space
    /// intersection point with the chinchilla, if any.
    fn pick(&self, ndc: Vector2<f32>) -> Option<Vector3<f32>>;
}

impl<F> PickSurface for F
where
    F: Fn(Vector2<f32>) -> Option<Vector3<f32>>,
{
    fn pick(&self, ndc: Vector2<f32>) -> Option<Vector3<f32>> {
        self(ndc)
    }
}

/// The two-node transform hierarchy driven by the controller.
///
/// The group node carries drag translation and the uniform interaction
/// scale; the model node carries the grab offset absorbed during a drag and
/// the spin angle. Splitting the nodes this way lets a drag move the grab
/// point with the pointer while the model keeps spinning about its own
/// pivot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigTransform {
    pub group_position: Vector3<f32>,
    pub model_position: Vector3<f32>,
    pub model_angle: Rad<f32>,
    pub scale: f32,
}

impl RigTransform {
    pub fn at_rest() -> Self {
        Self {
            group_position: Vector3::zero(),
            model_position: Vector3::zero(),
            model_angle: Rad(DEFAULT_MODEL_ANGLE),
            scale: DEFAULT_SCALE,
        }
    }

    /// Composed matrix: `T(group) · S(scale) · T(model) · R_y(angle)`.
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.group_position)
            * Matrix4::from_scale(self.scale)
            * Matrix4::from_translation(self.model_position)
            * Matrix4::from_angle_y(self.model_angle)
    }
}

/// State of an in-flight drag. At most one exists at any time.
#[derive(Debug, Clone, Copy)]
struct DragSession {
    start_ndc: Vector2<f32>,
    /// Group world position minus the grab intersection point, captured at
    /// press time and transferred between the group and model nodes.
    origin_offset: Vector3<f32>,
    /// Whether the most recent pointer ray still hit the chinchilla. Read
    /// at release time by the click check.
    hovering: bool,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Hovering,
    Dragging(DragSession),
    /// Released away from the trash; the spring is walking the rig home.
    Returning,
    /// Consumed, shrinking toward the can; waiting on the settle timer.
    Consuming { cycle: CycleId },
    /// Scale has settled at zero; waiting on the respawn timer.
    Respawning { cycle: CycleId },
}

/// Pattern-matched instead of null-checked: until the asset load delivers a
/// model there is no phase machine to run.
enum Lifecycle {
    Uninitialized,
    Ready { phase: Phase },
}

#[derive(Debug, Clone, Copy)]
struct AnimationState {
    current_spin_speed: f32,
    target_spin_speed: f32,
    current_scale: f32,
    target_scale: f32,
}

impl AnimationState {
    fn at_rest() -> Self {
        Self {
            current_spin_speed: 0.0,
            target_spin_speed: 0.0,
            current_scale: DEFAULT_SCALE,
            target_scale: DEFAULT_SCALE,
        }
    }
}

pub struct InteractionController {
    lifecycle: Lifecycle,
    pointer_ndc: Vector2<f32>,
    pointer_px: Vector2<f32>,
    anim: AnimationState,
    rig: RigTransform,
    trash: TrashGeometry,
    visual: TrashVisual,
    /// Pointer inside the active drop zone during the current drag.
    over_trash: bool,
    cursor: CursorIcon,
    schedule: ConsumeSchedule,
}

impl InteractionController {
    pub fn new(trash: TrashGeometry) -> Self {
        Self {
            lifecycle: Lifecycle::Uninitialized,
            pointer_ndc: Vector2::zero(),
            pointer_px: Vector2::zero(),
            anim: AnimationState::at_rest(),
            rig: RigTransform::at_rest(),
            trash,
            visual: TrashVisual::default(),
            over_trash: false,
            cursor: CursorIcon::Default,
            schedule: ConsumeSchedule::new(CONSUME_TIMEOUT, RESPAWN_TIMEOUT),
        }
    }

    /// Called once the asset load has delivered a model.
    pub fn mark_ready(&mut self) {
        self.lifecycle = Lifecycle::Ready { phase: Phase::Idle };
        self.anim = AnimationState::at_rest();
        self.rig = RigTransform::at_rest();
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Ready { .. })
    }

    /// Replaces the trash geometry after a resize re-derivation.
    pub fn set_trash_geometry(&mut self, trash: TrashGeometry) {
        self.trash = trash;
    }

    pub fn cursor(&self) -> CursorIcon {
        self.cursor
    }

    pub fn trash_visual(&self) -> TrashVisual {
        self.visual
    }

    pub fn rig(&self) -> &RigTransform {
        &self.rig
    }

    /// Pointer moved to `pointer_px` within a surface of `viewport` pixels.
    pub fn on_pointer_move(
        &mut self,
        pointer_px: Vector2<f32>,
        viewport: Vector2<f32>,
        projection: Projection,
        picker: &impl PickSurface,
    ) {
        self.pointer_px = pointer_px;
        self.pointer_ndc = Vector2::new(
            pointer_px.x / viewport.x * 2.0 - 1.0,
            -(pointer_px.y / viewport.y * 2.0 - 1.0),
        );

        let Lifecycle::Ready { phase } = &mut self.lifecycle else {
            return;
        };
        // A consumed chinchilla ignores the pointer until it respawns; the
        // settle timer owns the trash styling in the meantime.
        if matches!(phase, Phase::Consuming { .. } | Phase::Respawning { .. }) {
            return;
        }

        let hovering = picker.pick(self.pointer_ndc).is_some();
        self.cursor = if hovering {
            CursorIcon::Pointer
        } else {
            CursorIcon::Default
        };

        self.anim.target_scale = DEFAULT_SCALE;

        if let Phase::Dragging(session) = phase {
            session.hovering = hovering;

            let displacement = viewport - self.pointer_px;
            self.visual.highlighted = self.trash.highlights(displacement);

            if self.trash.contains(displacement) {
                self.visual.active = true;
                self.over_trash = true;
                self.anim.target_scale =
                    self.trash.shrink_scale(projection.half_width, viewport.x);
            } else {
                self.visual.active = false;
                self.over_trash = false;
            }
        } else {
            self.visual = TrashVisual::default();
            if hovering {
                *phase = Phase::Hovering;
            } else if !matches!(phase, Phase::Returning) {
                *phase = Phase::Idle;
            }
        }
    }

    /// Left button pressed. Starts a drag only from a re-validated hover:
    /// the hover flag can be stale if the model moved since the last
    /// pointer event, so a fresh ray is cast before grabbing.
    pub fn on_press(&mut self, picker: &impl PickSurface) {
        let Lifecycle::Ready { phase } = &mut self.lifecycle else {
            return;
        };
        if !matches!(phase, Phase::Hovering) {
            return;
        }
        let Some(grab_point) = picker.pick(self.pointer_ndc) else {
            return;
        };

        let origin_offset = self.rig.group_position - grab_point;
        // Reparent the offset: the model's local position absorbs it so the
        // group's position can track the pointer directly.
        self.rig.group_position -= origin_offset;
        self.rig.model_position += origin_offset;

        *phase = Phase::Dragging(DragSession {
            start_ndc: self.pointer_ndc,
            origin_offset,
            hovering: true,
        });
    }

    /// Left button released.
    pub fn on_release(&mut self, now: Instant) {
        let Lifecycle::Ready { phase } = &mut self.lifecycle else {
            return;
        };
        let Phase::Dragging(session) = *phase else {
            return;
        };

        let travelled = (self.pointer_ndc - session.start_ndc).magnitude();
        if session.hovering && travelled < DRAG_DISTANCE_EPSILON {
            // A click, not a drag: spin faster. Additive and unbounded; the
            // spin-rate map keeps the apparent speed readable.
            self.anim.target_spin_speed += 1.0;
        }

        if self.over_trash {
            let cycle = self.schedule.begin_cycle(now);
            self.anim.target_scale = 0.0;
            self.cursor = CursorIcon::Default;
            // The trash styling stays lit until the settle timer clears it.
            *phase = Phase::Consuming { cycle };
            log::debug!("chinchilla consumed (cycle {cycle})");
        } else {
            self.anim.target_scale = DEFAULT_SCALE;
            // Undo the reparenting from the grab so the spring acts on the
            // group alone. World position is unchanged.
            self.rig.model_position -= session.origin_offset;
            self.rig.group_position += session.origin_offset;
            *phase = Phase::Returning;
        }
        self.over_trash = false;
    }

    /// Advances the animation state by `dt` seconds and recomputes the rig.
    /// Runs once per display refresh.
    pub fn tick(&mut self, dt: f32, now: Instant, projection: Projection) {
        for fired in self.schedule.drain_due(now) {
            self.apply_timer(fired);
        }

        self.anim.current_spin_speed = lerp_clamped(
            self.anim.current_spin_speed,
            self.anim.target_spin_speed,
            dt,
        );
        self.anim.current_scale = lerp_clamped(
            self.anim.current_scale,
            self.anim.target_scale,
            dt * SCALE_TRANSITION_SPEED,
        );

        let Lifecycle::Ready { phase } = &mut self.lifecycle else {
            return;
        };

        self.rig.scale = self.anim.current_scale;
        self.rig.model_angle += Rad(dt * spin_rate(self.anim.current_spin_speed));

        match phase {
            Phase::Dragging(session) => {
                // NDC delta from the drag start, scaled into world units and
                // rotated into the ground plane to compensate the camera's
                // elevation angle.
                let delta = (self.pointer_ndc - session.start_ndc)
                    .mul_element_wise(Vector2::new(-projection.half_width, projection.half_height));
                let translation = Matrix3::from_angle_z(Rad(PI - POLAR_ANGLE))
                    * Vector3::new(delta.y, 0.0, delta.x);
                self.rig.group_position = translation - session.origin_offset;
            }
            Phase::Consuming { .. } | Phase::Respawning { .. } => {}
            Phase::Idle | Phase::Hovering | Phase::Returning => {
                let to_origin = -self.rig.group_position;
                self.rig.group_position += to_origin * (dt * RETURN_SPEED);
                if matches!(phase, Phase::Returning)
                    && self.rig.group_position.magnitude() < SETTLE_EPSILON
                {
                    *phase = Phase::Idle;
                }
            }
        }
    }

    fn apply_timer(&mut self, fired: FiredTimer) {
        let Lifecycle::Ready { phase } = &mut self.lifecycle else {
            return;
        };
        match fired.kind {
            TimerKind::Settle => {
                if matches!(phase, Phase::Consuming { cycle } if *cycle == fired.cycle) {
                    self.anim.current_scale = 0.0;
                    self.visual = TrashVisual::default();
                    *phase = Phase::Respawning { cycle: fired.cycle };
                }
            }
            TimerKind::Respawn => {
                let live = matches!(
                    phase,
                    Phase::Consuming { cycle } | Phase::Respawning { cycle }
                        if *cycle == fired.cycle
                );
                if live {
                    self.rig = RigTransform::at_rest();
                    self.rig.scale = 0.0;
                    self.anim = AnimationState::at_rest();
                    self.anim.current_scale = 0.0;
                    self.visual = TrashVisual::default();
                    *phase = Phase::Idle;
                    log::debug!("chinchilla respawned");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::trash::TrashStyle;

    fn viewport() -> Vector2<f32> {
        Vector2::new(800.0, 600.0)
    }

    fn projection() -> Projection {
        Projection {
            half_width: 5.0,
            half_height: 600.0 / 800.0 * 5.0,
        }
    }

    fn controller() -> InteractionController {
        let mut controller =
            InteractionController::new(TrashStyle::default().geometry().unwrap());
        controller.mark_ready();
        controller
    }

    fn hit_at(point: Vector3<f32>) -> impl PickSurface {
        move |_ndc: Vector2<f32>| Some(point)
    }

    fn hit_origin() -> impl PickSurface {
        hit_at(Vector3::zero())
    }

    fn miss() -> impl PickSurface {
        |_ndc: Vector2<f32>| None
    }

    fn center(controller: &mut InteractionController, picker: &impl PickSurface) {
        controller.on_pointer_move(
            Vector2::new(400.0, 300.0),
            viewport(),
            projection(),
            picker,
        );
    }

    #[test]
    fn test_uninitialized_ignores_everything() {
        let mut controller =
            InteractionController::new(TrashStyle::default().geometry().unwrap());
        center(&mut controller, &hit_origin());
        controller.on_press(&hit_origin());
        controller.on_release(Instant::now());
        controller.tick(0.016, Instant::now(), projection());

        assert_eq!(controller.cursor(), CursorIcon::Default);
        assert_eq!(*controller.rig(), RigTransform::at_rest());
    }

    #[test]
    fn test_hover_tracks_the_ray() {
        let mut controller = controller();
        center(&mut controller, &hit_origin());
        assert_eq!(controller.cursor(), CursorIcon::Pointer);
        assert!(matches!(
            controller.lifecycle,
            Lifecycle::Ready {
                phase: Phase::Hovering
            }
        ));

        center(&mut controller, &miss());
        assert_eq!(controller.cursor(), CursorIcon::Default);
        assert!(matches!(
            controller.lifecycle,
            Lifecycle::Ready { phase: Phase::Idle }
        ));
    }

    #[test]
    fn test_press_requires_fresh_hit() {
        let mut controller = controller();
        center(&mut controller, &hit_origin());
        // The hover is stale by press time: the fresh ray misses.
        controller.on_press(&miss());
        assert!(!matches!(
            controller.lifecycle,
            Lifecycle::Ready {
                phase: Phase::Dragging(_)
            }
        ));
    }

    #[test]
    fn test_press_while_dragging_is_a_noop() {
        let mut controller = controller();
        center(&mut controller, &hit_origin());
        controller.on_press(&hit_origin());
        let first_start = drag_start(&controller);

        controller.on_pointer_move(
            Vector2::new(500.0, 300.0),
            viewport(),
            projection(),
            &hit_origin(),
        );
        controller.on_press(&hit_origin());
        assert_eq!(first_start, drag_start(&controller));
    }

    fn drag_start(controller: &InteractionController) -> Vector2<f32> {
        match &controller.lifecycle {
            Lifecycle::Ready {
                phase: Phase::Dragging(session),
            } => session.start_ndc,
            _ => panic!("expected an active drag"),
        }
    }

    #[test]
    fn test_click_bumps_spin_speed_by_one() {
        let mut controller = controller();
        for expected in 1..=3 {
            center(&mut controller, &hit_origin());
            controller.on_press(&hit_origin());
            controller.on_release(Instant::now());
            assert_eq!(controller.anim.target_spin_speed, expected as f32);
        }
    }

    #[test]
    fn test_drag_position_follows_pointer_math() {
        let mut controller = controller();
        center(&mut controller, &hit_origin());
        controller.on_press(&hit_origin());

        // 0.2 NDC right, 0.4 NDC up from the drag start.
        controller.on_pointer_move(
            Vector2::new(480.0, 180.0),
            viewport(),
            projection(),
            &hit_origin(),
        );
        controller.tick(0.016, Instant::now(), projection());

        // delta = (0.2, 0.4) * (-5, 3.75) = (-1, 1.5), lifted to
        // (1.5, 0, -1) and rotated by 2π/3 about +Z.
        let expected = Vector3::new(-0.75, 1.5 * (3.0_f32).sqrt() / 2.0, -1.0);
        let position = controller.rig().group_position;
        assert!((position - expected).magnitude() < 1.0e-4, "{position:?}");
    }

    #[test]
    fn test_release_outside_trash_springs_home() {
        let mut controller = controller();
        center(&mut controller, &hit_origin());
        controller.on_press(&hit_origin());
        controller.on_pointer_move(
            Vector2::new(480.0, 180.0),
            viewport(),
            projection(),
            &hit_origin(),
        );
        controller.tick(0.016, Instant::now(), projection());
        controller.on_release(Instant::now());

        assert!(matches!(
            controller.lifecycle,
            Lifecycle::Ready {
                phase: Phase::Returning
            }
        ));
        assert_eq!(controller.anim.target_scale, DEFAULT_SCALE);

        // Exponential decay at rate 5: dt = 0.1 halves the distance.
        let mut distance = controller.rig().group_position.magnitude();
        assert!(distance > 0.1);
        for _ in 0..8 {
            controller.tick(0.1, Instant::now(), projection());
            let next = controller.rig().group_position.magnitude();
            assert!(next < distance, "distance must strictly decrease");
            assert!((next - distance * 0.5).abs() < 1.0e-4);
            distance = next;
        }
    }

    #[test]
    fn test_returning_settles_to_idle() {
        let mut controller = controller();
        center(&mut controller, &hit_origin());
        controller.on_press(&hit_origin());
        controller.on_pointer_move(
            Vector2::new(480.0, 180.0),
            viewport(),
            projection(),
            &hit_origin(),
        );
        controller.tick(0.016, Instant::now(), projection());
        controller.on_release(Instant::now());

        for _ in 0..200 {
            controller.tick(0.05, Instant::now(), projection());
        }
        assert!(matches!(
            controller.lifecycle,
            Lifecycle::Ready { phase: Phase::Idle }
        ));
        assert!(controller.rig().group_position.magnitude() < SETTLE_EPSILON);
    }

    fn drag_into_trash(controller: &mut InteractionController) {
        center(controller, &hit_origin());
        controller.on_press(&hit_origin());
        // Displacement from the far corner is (48, 48): strictly inside
        // (margin, margin + active_length) = (16, 80) on both axes.
        controller.on_pointer_move(
            Vector2::new(752.0, 552.0),
            viewport(),
            projection(),
            &hit_origin(),
        );
    }

    #[test]
    fn test_drag_over_trash_sets_shrink_target() {
        let mut controller = controller();
        drag_into_trash(&mut controller);

        assert!(controller.trash_visual().active);
        assert!(controller.trash_visual().highlighted);
        // active_length / (2 * width_px(4)) with half-width 5, width 800.
        assert!((controller.anim.target_scale - 0.1).abs() < 1.0e-6);
    }

    #[test]
    fn test_consume_settle_respawn_cycle() {
        let mut controller = controller();
        let t0 = Instant::now();
        drag_into_trash(&mut controller);
        controller.on_release(t0);

        assert!(matches!(
            controller.lifecycle,
            Lifecycle::Ready {
                phase: Phase::Consuming { .. }
            }
        ));
        assert_eq!(controller.anim.target_scale, 0.0);
        assert_eq!(controller.cursor(), CursorIcon::Default);
        // Styling stays lit until the settle timer clears it.
        assert!(controller.trash_visual().active);

        // Pointer input is ignored while consumed.
        center(&mut controller, &hit_origin());
        controller.on_press(&hit_origin());
        assert!(matches!(
            controller.lifecycle,
            Lifecycle::Ready {
                phase: Phase::Consuming { .. }
            }
        ));

        controller.tick(0.016, t0 + Duration::from_millis(600), projection());
        assert!(matches!(
            controller.lifecycle,
            Lifecycle::Ready {
                phase: Phase::Respawning { .. }
            }
        ));
        assert_eq!(controller.anim.current_scale, 0.0);
        assert_eq!(controller.trash_visual(), TrashVisual::default());

        controller.tick(0.016, t0 + Duration::from_millis(2100), projection());
        assert!(matches!(
            controller.lifecycle,
            Lifecycle::Ready { phase: Phase::Idle }
        ));
        assert_eq!(controller.rig().group_position, Vector3::zero());
        assert_eq!(controller.rig().model_position, Vector3::zero());
        assert_eq!(controller.rig().model_angle, Rad(DEFAULT_MODEL_ANGLE));
        // The respawn reset the scale to zero, then this very tick started
        // growing it back toward the default.
        assert!(controller.anim.current_scale > 0.0);
        assert!(controller.anim.current_scale < 0.2);
        assert_eq!(controller.anim.target_scale, DEFAULT_SCALE);
        assert_eq!(controller.anim.target_spin_speed, 0.0);
    }

    #[test]
    fn test_scale_grows_back_after_respawn() {
        let mut controller = controller();
        let t0 = Instant::now();
        drag_into_trash(&mut controller);
        controller.on_release(t0);
        controller.tick(0.016, t0 + Duration::from_millis(600), projection());
        controller.tick(0.016, t0 + Duration::from_millis(2100), projection());

        let mut scale = controller.rig().scale;
        for i in 0..10 {
            controller.tick(
                0.05,
                t0 + Duration::from_millis(2200 + i * 50),
                projection(),
            );
            let next = controller.rig().scale;
            assert!(next > scale, "scale must grow back toward default");
            scale = next;
        }
        assert!(scale <= DEFAULT_SCALE);
    }

    #[test]
    fn test_grab_offset_transfer_preserves_world_position() {
        let mut controller = controller();
        center(&mut controller, &hit_origin());
        let grab_point = Vector3::new(0.3, 0.0, -0.2);
        controller.on_press(&hit_at(grab_point));

        let rig = controller.rig();
        // group + model is the model's world position; the transfer must
        // not move it.
        assert!(
            (rig.group_position + rig.model_position).magnitude() < 1.0e-6,
            "world position moved during grab"
        );
        assert_eq!(rig.group_position, grab_point);
    }
}
