//! Fleet scene for the frame demo
//!
//! Frigates are transform roots drifting forward; escorts are their
//! children, orbiting by rotating in local space. Every ship owns one 3D
//! render command, and each frigate has a 2D HUD label.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rand::Rng;
use scene_pipeline::foundation::collections::NodeId;
use scene_pipeline::foundation::math::{translation_of, Mat4, Quat, Vec2, Vec3};
use scene_pipeline::prelude::*;
use scene_pipeline::render::RenderInfoId;

const NUM_FRIGATES: usize = 3;
const ESCORTS_PER_FRIGATE: usize = 4;
const FRIGATE_SPACING: f32 = 30.0;
const FRIGATE_SPEED: f32 = 4.0;
const ESCORT_ORBIT_RADIUS: f32 = 6.0;
const CLOAK_INTERVAL: usize = 45;

/// Pass ids used by the demo (match the default pipeline config)
const OPAQUE_PASS: PassId = 0;
const TRANSPARENT_PASS: PassId = 1;
const OVERLAY_PASS: PassId = 2;

/// Draw state of one ship
#[derive(Debug, Clone)]
pub struct ShipState {
    pub world: Mat4,
    pub position: Vec3,
}

/// Stand-in for a GPU mesh draw: counts and traces
pub struct ShipMesh {
    name: String,
    draws: Arc<AtomicUsize>,
}

impl Drawable3D for ShipMesh {
    type State = ShipState;

    fn world_position(&self, state: &ShipState) -> Vec3 {
        state.position
    }

    fn draw(&self, snapshot: &ShipState, shadow_pass: bool) {
        self.draws.fetch_add(1, Ordering::Relaxed);
        log::trace!(
            "draw {} model translation {:?} (shadow: {})",
            self.name,
            translation_of(&snapshot.world),
            shadow_pass
        );
    }
}

/// Frigate name plate
pub struct HudLabel {
    text: String,
    draws: Arc<AtomicUsize>,
}

impl Drawable2D for HudLabel {
    type State = Vec2;

    fn draw(&self, position: &Vec2, _shadow_pass: bool) {
        self.draws.fetch_add(1, Ordering::Relaxed);
        log::trace!("label '{}' at {:?}", self.text, position);
    }
}

struct Ship {
    node: NodeId,
    info: RenderInfo3D,
    mesh: Arc<RenderCommand3D<ShipMesh>>,
    moved: Arc<AtomicBool>,
    spin: f32,
    extents: Vec3,
}

/// Per-frame counts reported by [`Fleet::collect`]
#[derive(Debug, Default, Clone, Copy)]
pub struct CollectStats {
    pub main: usize,
    pub shadow: usize,
    pub overlay: usize,
}

/// Scene owner: transform tree, visual scenes, render infos
pub struct Fleet {
    tree: TransformTree,
    world_scene: Arc<VisualScene>,
    hud_scene: Arc<VisualScene>,
    frigates: Vec<NodeId>,
    ships: Vec<Ship>,
    ship_lookup: HashMap<RenderInfoId, usize>,
    labels: Vec<RenderInfo2D>,
    label_lookup: HashMap<RenderInfoId, usize>,
    draws: Arc<AtomicUsize>,
}

impl Fleet {
    /// Build frigates with randomized escorts
    pub fn spawn(rng: &mut impl Rng) -> Result<Self, TransformError> {
        let mut fleet = Self {
            tree: TransformTree::new(),
            world_scene: VisualScene::new("fleet"),
            hud_scene: VisualScene::new("hud"),
            frigates: Vec::new(),
            ships: Vec::new(),
            ship_lookup: HashMap::new(),
            labels: Vec::new(),
            label_lookup: HashMap::new(),
            draws: Arc::new(AtomicUsize::new(0)),
        };

        let mut entity = 0;
        for f in 0..NUM_FRIGATES {
            let offset = (f as f32 - (NUM_FRIGATES as f32 - 1.0) / 2.0) * FRIGATE_SPACING;
            let frigate = fleet.tree.create_node(EntityId::new(entity), None)?;
            entity += 1;
            fleet.tree.set_translation(frigate, Vec3::new(offset, 0.0, 0.0))?;
            fleet.tree.set_scale(frigate, Vec3::new(2.0, 1.0, 4.0))?;
            fleet.add_ship(format!("frigate-{f}"), frigate, OPAQUE_PASS, 0.0, Vec3::new(2.0, 1.0, 4.0))?;
            fleet.frigates.push(frigate);

            for e in 0..ESCORTS_PER_FRIGATE {
                let angle = e as f32 / ESCORTS_PER_FRIGATE as f32 * std::f32::consts::TAU;
                let escort = fleet.tree.create_node(EntityId::new(entity), Some(frigate))?;
                entity += 1;
                fleet.tree.set_order(escort, CompositionOrder::Rts)?;
                fleet.tree.set_rotation(escort, Quat::from_axis_angle(&Vec3::y_axis(), angle))?;
                fleet.tree.set_translation(
                    escort,
                    Vec3::new(ESCORT_ORBIT_RADIUS, rng.gen_range(-1.0..1.0), 0.0),
                )?;

                // Some escorts carry shields and draw in the transparent pass
                let pass = if rng.gen_bool(0.25) { TRANSPARENT_PASS } else { OPAQUE_PASS };
                let spin = rng.gen_range(0.5..1.5);
                fleet.add_ship(format!("escort-{f}-{e}"), escort, pass, spin, Vec3::repeat(0.5))?;
            }

            let draws = Arc::clone(&fleet.draws);
            let label = RenderInfo2D::new()
                .with_rect(Rect::from_position_size(Vec2::new(20.0, 20.0 + 24.0 * f as f32), Vec2::new(160.0, 20.0)))
                .with_command(RenderCommand2D::shared(
                    OVERLAY_PASS,
                    f as i32,
                    HudLabel {
                        text: format!("Frigate {f}"),
                        draws,
                    },
                    Vec2::new(20.0, 20.0 + 24.0 * f as f32),
                ));
            fleet.attach_label(label);
        }

        log::info!(
            "Fleet spawned: {} nodes, {} ships registered",
            fleet.tree.len(),
            fleet.world_scene.registered_count()
        );
        Ok(fleet)
    }

    fn add_ship(&mut self, name: String, node: NodeId, pass: PassId, spin: f32, extents: Vec3) -> Result<(), TransformError> {
        let moved = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&moved);
        self.tree
            .subscribe(node, move |_change: &MatrixChanged| flag.store(true, Ordering::Release))?;

        let world = self.tree.world_matrix(node)?;
        let position = translation_of(&world);
        let mesh = RenderCommand3D::shared(
            pass,
            ShipMesh {
                name,
                draws: Arc::clone(&self.draws),
            },
            ShipState { world, position },
        );

        let mut info = RenderInfo3D::new()
            .with_culling_volume(AABB::from_center_extents(position, extents))
            .with_command(mesh.clone());
        info.set_scene(Some(Arc::clone(&self.world_scene)));

        self.ship_lookup.insert(info.id(), self.ships.len());
        self.ships.push(Ship {
            node,
            info,
            mesh,
            moved,
            spin,
            extents,
        });
        Ok(())
    }

    fn attach_label(&mut self, mut label: RenderInfo2D) {
        label.set_scene(Some(Arc::clone(&self.hud_scene)));
        self.label_lookup.insert(label.id(), self.labels.len());
        self.labels.push(label);
    }

    /// Advance the simulation and push moved transforms into command state
    pub fn update(&mut self, frame: usize, dt: f32) -> Result<(), TransformError> {
        for &frigate in &self.frigates {
            let position = self.tree.translation(frigate)?;
            self.tree
                .set_translation(frigate, position + Vec3::new(0.0, 0.0, -FRIGATE_SPEED * dt))?;
        }

        let t = frame as f32 * dt;
        for ship in &self.ships {
            if ship.spin > 0.0 {
                let angle = ship.spin * t;
                self.tree
                    .set_rotation(ship.node, Quat::from_axis_angle(&Vec3::y_axis(), angle))?;
            }
        }

        // Escorts of the middle frigate cloak and decloak periodically
        if frame > 0 && frame % CLOAK_INTERVAL == 0 {
            let visible = (frame / CLOAK_INTERVAL) % 2 == 0;
            if let Some(&middle) = self.frigates.get(NUM_FRIGATES / 2) {
                let escorts = self.tree.children(middle)?;
                for ship in self.ships.iter_mut().filter(|ship| escorts.contains(&ship.node)) {
                    ship.info.set_visible(visible);
                }
                log::debug!("Escort cloak {}", if visible { "off" } else { "on" });
            }
        }

        self.sync_transforms()
    }

    fn sync_transforms(&mut self) -> Result<(), TransformError> {
        for ship in &mut self.ships {
            if !ship.moved.swap(false, Ordering::AcqRel) {
                continue;
            }
            let world = self.tree.world_matrix(ship.node)?;
            let position = translation_of(&world);
            ship.mesh.set_state(ShipState { world, position });
            ship.info
                .set_culling_volume(Some(AABB::from_center_extents(position, ship.extents).into()));
        }
        Ok(())
    }

    /// Average frigate position, for the camera to track
    pub fn centroid(&self) -> Result<Vec3, TransformError> {
        let mut sum = Vec3::zeros();
        for &frigate in &self.frigates {
            sum += translation_of(&self.tree.world_matrix(frigate)?);
        }
        Ok(sum / self.frigates.len().max(1) as f32)
    }

    /// Collect the current frame into the main and shadow collections
    pub fn collect(
        &self,
        main: &RenderCommandCollection,
        shadows: Option<&RenderCommandCollection>,
        camera: &Camera,
    ) -> CollectStats {
        let mut stats = CollectStats::default();
        let frustum = camera.culling_volume();

        for id in self.world_scene.query_visible(Some(&frustum)) {
            let Some(ship) = self.ship_lookup.get(&id).map(|&index| &self.ships[index]) else {
                continue;
            };
            if ship.info.allow_render(Some(&frustum), main, Some(camera)) {
                stats.main += ship.info.add_render_commands(main, Some(camera));
            }
        }

        // Shadow map covers the whole registered fleet
        if let Some(shadows) = shadows {
            for id in self.world_scene.query_visible(None) {
                let Some(ship) = self.ship_lookup.get(&id).map(|&index| &self.ships[index]) else {
                    continue;
                };
                if ship.info.allow_render(None, shadows, None) {
                    stats.shadow += ship.info.add_render_commands(shadows, None);
                }
            }
        }

        let screen: CullingVolume = Rect::new(Vec2::zeros(), Vec2::new(1280.0, 720.0)).into();
        for id in self.hud_scene.query_visible(Some(&screen)) {
            let Some(label) = self.label_lookup.get(&id).map(|&index| &self.labels[index]) else {
                continue;
            };
            if label.allow_render(Some(&screen), main, None) {
                stats.overlay += label.add_render_commands(main, None);
            }
        }

        stats
    }

    /// Total draw calls issued so far
    pub fn draw_count(&self) -> usize {
        self.draws.load(Ordering::Relaxed)
    }
}
