//! Orbit camera with animated retargeting
//!
//! [`CameraController`] is the [`CameraRig`] the viewer core frames models
//! through. Left drag orbits, right drag pans, the wheel zooms.

use bevy::ecs::message::MessageReader;
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use ifc_glance_model::CameraRig;

/// System set for camera input (for ordering)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CameraInputSet;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<CameraRested>()
            .add_systems(Startup, setup_camera)
            .add_systems(
                Update,
                (camera_input_system, camera_keyboard_system, camera_update_system)
                    .chain()
                    .in_set(CameraInputSet),
            );

        let fov = app
            .world()
            .get_resource::<crate::ViewerSettings>()
            .map(|s| s.fov_degrees)
            .unwrap_or(45.0);
        app.insert_resource(CameraController {
            fov,
            ..default()
        });
    }
}

/// Written once when the camera comes to rest after moving
#[derive(Message, Debug, Clone, Copy)]
pub struct CameraRested;

#[derive(Resource)]
pub struct CameraController {
    /// Point the camera orbits around
    pub target: Vec3,
    pub distance: f32,
    /// Horizontal angle around +Y
    pub azimuth: f32,
    /// Vertical angle above the XZ plane
    pub elevation: f32,
    /// Damping factor for smooth movement (0.0 = instant, 1.0 = never moves)
    pub damping: f32,
    /// Angular velocity for orbit inertia
    pub angular_velocity: Vec2,
    pub animation_target: Option<CameraAnimationTarget>,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub orbit_sensitivity: f32,
    pub pan_sensitivity: f32,
    pub zoom_sensitivity: f32,
    /// Left button held
    pub is_dragging: bool,
    /// Right button held
    pub is_panning: bool,
    /// Mouse position when drag started (for click detection)
    pub drag_start_pos: Vec2,
    /// Mouse moved significantly since the button went down
    pub did_drag: bool,
    /// Left button released without dragging; consumed by picking
    pub just_clicked: bool,
    /// Moving during the previous frame
    pub in_motion: bool,
}

impl Default for CameraController {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 30.0,
            azimuth: 0.785,   // 45 degrees
            elevation: 0.615, // ~35 degrees (isometric)
            damping: 0.92,
            angular_velocity: Vec2::ZERO,
            animation_target: None,
            fov: 45.0,
            near: 0.05,
            far: 100_000.0,
            min_distance: 0.1,
            max_distance: 50_000.0,
            orbit_sensitivity: 0.005,
            pan_sensitivity: 0.01,
            zoom_sensitivity: 0.02,
            is_dragging: false,
            is_panning: false,
            drag_start_pos: Vec2::ZERO,
            did_drag: false,
            just_clicked: false,
            in_motion: false,
        }
    }
}

impl CameraController {
    /// Camera position from spherical coordinates
    pub fn get_position(&self) -> Vec3 {
        self.target + spherical_offset(self.azimuth, self.elevation, self.distance)
    }

    /// Animate to a preset orientation, keeping target and distance
    pub fn set_preset_view(&mut self, azimuth: f32, elevation: f32) {
        self.animate_to(azimuth, elevation, self.distance, self.target);
    }

    pub fn home(&mut self) {
        self.set_preset_view(0.785, 0.615);
    }

    pub fn is_animating(&self) -> bool {
        self.animation_target.is_some()
    }

    /// Take the pending click, if any
    pub fn take_click(&mut self) -> bool {
        std::mem::take(&mut self.just_clicked)
    }

    /// Fit clip planes and zoom limits to a scene of the given size
    pub fn adapt_to_scene(&mut self, diagonal: f32) {
        let diagonal = diagonal.max(1.0);
        let reach = self
            .animation_target
            .as_ref()
            .map_or(self.distance, |a| a.distance.max(self.distance));
        self.near = (diagonal * 1e-4).max(0.01);
        self.far = (diagonal * 50.0).max(reach * 10.0);
        self.min_distance = (diagonal * 1e-3).max(0.05);
        self.max_distance = (diagonal * 20.0).max(reach);
    }

    fn animate_to(&mut self, azimuth: f32, elevation: f32, distance: f32, target: Vec3) {
        self.angular_velocity = Vec2::ZERO;
        self.animation_target = Some(CameraAnimationTarget {
            azimuth,
            elevation,
            distance,
            target,
            duration: 0.5,
            elapsed: 0.0,
        });
    }

    /// Advance the running animation by `dt` seconds
    pub fn step_animation(&mut self, dt: f32) {
        let Some(anim) = self.animation_target.as_mut() else {
            return;
        };
        anim.elapsed += dt;
        let t = (anim.elapsed / anim.duration).min(1.0);
        // Ease out cubic
        let t = 1.0 - (1.0 - t).powi(3);
        let anim = anim.clone();

        self.azimuth = lerp(self.azimuth, anim.azimuth, t);
        self.elevation = lerp(self.elevation, anim.elevation, t);
        self.distance = lerp(self.distance, anim.distance, t);
        self.target = self.target.lerp(anim.target, t);

        if anim.elapsed >= anim.duration {
            self.azimuth = anim.azimuth;
            self.elevation = anim.elevation;
            self.distance = anim.distance;
            self.target = anim.target;
            self.animation_target = None;
        }
    }
}

impl CameraRig for CameraController {
    fn vertical_fov(&self) -> f64 {
        (self.fov as f64).to_radians()
    }

    fn look_at(&mut self, position: [f64; 3], target: [f64; 3], animate: bool) {
        let target = Vec3::new(target[0] as f32, target[1] as f32, target[2] as f32);
        let position = Vec3::new(position[0] as f32, position[1] as f32, position[2] as f32);
        let (azimuth, elevation, distance) = orbit_from_offset(position - target);

        // Never clamp the requested framing away
        self.max_distance = self.max_distance.max(distance * 4.0);
        self.far = self.far.max(distance * 10.0);
        self.near = self.near.min((distance * 1e-4).max(0.01));

        if animate {
            self.animate_to(azimuth, elevation, distance, target);
        } else {
            self.animation_target = None;
            self.azimuth = azimuth;
            self.elevation = elevation;
            self.distance = distance;
            self.target = target;
        }
    }
}

#[derive(Clone, Debug)]
pub struct CameraAnimationTarget {
    pub azimuth: f32,
    pub elevation: f32,
    pub distance: f32,
    pub target: Vec3,
    pub duration: f32,
    pub elapsed: f32,
}

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

fn spherical_offset(azimuth: f32, elevation: f32, distance: f32) -> Vec3 {
    Vec3::new(
        distance * elevation.cos() * azimuth.sin(),
        distance * elevation.sin(),
        distance * elevation.cos() * azimuth.cos(),
    )
}

/// (azimuth, elevation, distance) of an offset from the orbit target
fn orbit_from_offset(offset: Vec3) -> (f32, f32, f32) {
    let distance = offset.length();
    if distance <= f32::EPSILON {
        return (0.0, 0.0, 0.0);
    }
    let elevation = (offset.y / distance).clamp(-1.0, 1.0).asin().clamp(-1.5, 1.5);
    let azimuth = offset.x.atan2(offset.z);
    (azimuth, elevation, distance)
}

fn setup_camera(mut commands: Commands, controller: Res<CameraController>) {
    use bevy::render::view::Msaa;

    let position = controller.get_position();

    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(position).looking_at(controller.target, Vec3::Y),
        Projection::Perspective(PerspectiveProjection {
            fov: controller.fov.to_radians(),
            near: controller.near,
            far: controller.far,
            ..default()
        }),
        MainCamera,
        Msaa::Sample4,
    ));

    commands.spawn(AmbientLight {
        color: Color::WHITE,
        brightness: 80.0,
        affects_lightmapped_meshes: true,
    });

    // Key light from top-right-front
    commands.spawn((
        DirectionalLight {
            color: Color::srgb(1.0, 0.99, 0.97),
            illuminance: 25000.0,
            shadows_enabled: false,
            affects_lightmapped_mesh_diffuse: true,
            ..default()
        },
        Transform::from_xyz(0.5, 1.0, 0.3).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Fill
    commands.spawn((
        DirectionalLight {
            color: Color::srgb(0.85, 0.9, 1.0),
            illuminance: 8000.0,
            shadows_enabled: false,
            affects_lightmapped_mesh_diffuse: true,
            ..default()
        },
        Transform::from_xyz(-0.5, 0.3, -0.5).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Rim
    commands.spawn((
        DirectionalLight {
            color: Color::srgb(0.9, 0.95, 1.0),
            illuminance: 5000.0,
            shadows_enabled: false,
            affects_lightmapped_mesh_diffuse: true,
            ..default()
        },
        Transform::from_xyz(-0.3, 0.8, -0.8).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn camera_input_system(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mut controller: ResMut<CameraController>,
    windows: Query<&Window>,
    #[cfg(feature = "bevy-ui")] ui_interactions: Query<&Interaction, With<Node>>,
) {
    let Ok(window) = windows.single() else { return };

    #[cfg(feature = "bevy-ui")]
    let mouse_over_ui = ui_interactions
        .iter()
        .any(|interaction| matches!(interaction, Interaction::Hovered | Interaction::Pressed));
    #[cfg(not(feature = "bevy-ui"))]
    let mouse_over_ui = false;

    if mouse_button.just_pressed(MouseButton::Left) && !mouse_over_ui {
        controller.is_dragging = true;
        controller.did_drag = false;
        controller.just_clicked = false;
        if let Some(pos) = window.cursor_position() {
            controller.drag_start_pos = pos;
        }
    }
    if mouse_button.just_released(MouseButton::Left) && controller.is_dragging {
        if !controller.did_drag {
            controller.just_clicked = true;
        }
        controller.is_dragging = false;
    }
    if mouse_button.just_pressed(MouseButton::Right) && !mouse_over_ui {
        controller.is_panning = true;
    }
    if mouse_button.just_released(MouseButton::Right) {
        controller.is_panning = false;
    }

    let mut motion = Vec2::ZERO;
    for ev in mouse_motion.read() {
        motion += ev.delta;
    }

    if controller.is_dragging {
        if let Some(pos) = window.cursor_position() {
            // More than 3 pixels from the press position is a drag
            if pos.distance(controller.drag_start_pos) > 3.0 {
                controller.did_drag = true;
            }
        }
        if motion != Vec2::ZERO {
            // User input cancels a running animation
            controller.animation_target = None;
            let sensitivity = controller.orbit_sensitivity;
            controller.azimuth -= motion.x * sensitivity;
            controller.elevation = (controller.elevation - motion.y * sensitivity).clamp(-1.5, 1.5);
            controller.angular_velocity = motion * sensitivity;
        }
    } else if controller.is_panning {
        if motion != Vec2::ZERO {
            controller.animation_target = None;
            let right = Vec3::new(controller.azimuth.cos(), 0.0, -controller.azimuth.sin());
            let scale = controller.pan_sensitivity * controller.distance * 0.1;
            let pan = (-right * motion.x + Vec3::Y * motion.y) * scale;
            controller.target += pan;
        }
    } else {
        // Orbit inertia
        let damping = controller.damping;
        controller.angular_velocity *= damping;
        if controller.angular_velocity.length() > 0.0001 {
            controller.azimuth -= controller.angular_velocity.x;
            controller.elevation = (controller.elevation - controller.angular_velocity.y).clamp(-1.5, 1.5);
        } else {
            controller.angular_velocity = Vec2::ZERO;
        }
    }

    if !mouse_over_ui {
        for ev in mouse_wheel.read() {
            controller.animation_target = None;
            let zoom_delta = ev.y * controller.zoom_sensitivity;
            controller.distance = (controller.distance * (1.0 - zoom_delta))
                .clamp(controller.min_distance, controller.max_distance);
        }
    }
}

fn camera_keyboard_system(keyboard: Res<ButtonInput<KeyCode>>, mut controller: ResMut<CameraController>) {
    use std::f32::consts::{FRAC_PI_2, PI};

    if keyboard.just_pressed(KeyCode::Digit1) {
        controller.set_preset_view(0.0, 0.0); // Front
    }
    if keyboard.just_pressed(KeyCode::Digit2) {
        controller.set_preset_view(PI, 0.0); // Back
    }
    if keyboard.just_pressed(KeyCode::Digit3) {
        controller.set_preset_view(-FRAC_PI_2, 0.0); // Left
    }
    if keyboard.just_pressed(KeyCode::Digit4) {
        controller.set_preset_view(FRAC_PI_2, 0.0); // Right
    }
    if keyboard.just_pressed(KeyCode::Digit5) {
        controller.set_preset_view(0.0, 1.5); // Top
    }
    if keyboard.just_pressed(KeyCode::KeyH) {
        controller.home();
    }
}

fn camera_update_system(
    mut controller: ResMut<CameraController>,
    mut camera: Query<(&mut Transform, &mut Projection), With<MainCamera>>,
    mut rested: MessageWriter<CameraRested>,
    time: Res<Time>,
) {
    controller.step_animation(time.delta_secs());

    let Ok((mut transform, mut projection)) = camera.single_mut() else {
        return;
    };

    let position = controller.get_position();
    let remaining = transform.translation.distance(position);
    transform.translation = transform
        .translation
        .lerp(position, 1.0 - controller.damping.powi(2));
    transform.look_at(controller.target, Vec3::Y);

    if let Projection::Perspective(perspective) = projection.as_mut() {
        perspective.fov = controller.fov.to_radians();
        perspective.near = controller.near;
        perspective.far = controller.far;
    }

    let moving = controller.is_animating()
        || controller.is_dragging
        || controller.is_panning
        || controller.angular_velocity != Vec2::ZERO
        || remaining > controller.distance * 1e-4;
    if controller.in_motion && !moving {
        rested.write(CameraRested);
    }
    controller.in_motion = moving;
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
