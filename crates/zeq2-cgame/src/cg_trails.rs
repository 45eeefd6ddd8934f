// cg_trails.rs -- ribbon trails behind fast moving entities
//
// Every entity slot owns one fixed chain of segments. Segment 0 is the
// head and is snapped to the entity each frame; the rest are pulled
// after it at a speed that falls off toward the tail, which gives the
// ribbon its elastic look.

use rayon::prelude::*;

use zeq2_common::q_shared::*;

use crate::cg_local::CgFrame;
use crate::cg_public::CgameImport;

pub const TRAIL_SEGMENTS: usize = 20;
pub const TRAIL_MIN_SPEED: f32 = 300.0;
pub const TRAIL_MAX_LENGTH: f32 = 2000.0 / TRAIL_SEGMENTS as f32;

/// trail_t
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Trail {
    pub pos: [Vec3; TRAIL_SEGMENTS],
    pub tangent: [Vec3; TRAIL_SEGMENTS],
    pub color: Vec3,
    /// 0 means the slot is unused
    pub shader: QHandle,
    pub width: f32,
    pub base_speed: f32,
}

impl Trail {
    /// Head and tail coincide, so there is nothing to draw.
    fn is_collapsed(&self) -> bool {
        distance(&self.pos[0], &self.pos[TRAIL_SEGMENTS - 1]) == 0.0
    }

    /// Whether this frame's relax and render passes should touch the trail.
    ///
    /// Guided missiles can loop the head back onto the tail, so they are
    /// always simulated.
    fn is_live(&self, guided: bool) -> bool {
        self.shader != 0 && (guided || !self.is_collapsed())
    }

    /// Pull every segment toward its head-ward neighbour for one frame.
    fn relax(&mut self, frametime: i32) {
        for i in 1..TRAIL_SEGMENTS {
            // set up the distance and direction
            let mut dir = vector_subtract(&self.pos[i - 1], &self.pos[i]);
            let dist = vector_normalize(&mut dir);

            let dist_delta = self.base_speed * ((28 - i) as f32 / 40.0) * frametime as f32 * 0.001;

            // if we'd overshoot, halt on the previous point
            if dist_delta > dist {
                self.pos[i] = self.pos[i - 1];
                self.tangent[i] = self.tangent[i - 1];
                continue;
            }

            // if the section gets too long, snap it forward like a rubberband
            if dist - dist_delta > TRAIL_MAX_LENGTH {
                self.pos[i] = vector_ma(&self.pos[i - 1], -TRAIL_MAX_LENGTH, &dir);
                self.tangent[i] = dir;
                continue;
            }

            self.pos[i] = vector_ma(&self.pos[i], dist_delta, &dir);
            self.tangent[i] = dir;
        }
    }
}

/// The per-entity trail table.
pub struct Trails {
    trails: Vec<Trail>,
    /// EF_GUIDED of each owner, refreshed by `lerp_trails`
    guided: Vec<bool>,
}

impl Default for Trails {
    fn default() -> Self {
        Self::new()
    }
}

impl Trails {
    /// Below this many live trails the relax pass stays on one thread.
    const PARALLEL_TRAIL_THRESHOLD: usize = 64;

    pub fn new() -> Self {
        Self::with_capacity(MAX_GENTITIES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            trails: vec![Trail::default(); capacity],
            guided: vec![false; capacity],
        }
    }

    /// CG_InitTrails
    pub fn init(&mut self) {
        self.trails.fill(Trail::default());
        self.guided.fill(false);
    }

    pub fn capacity(&self) -> usize {
        self.trails.len()
    }

    pub fn get(&self, ent_num: usize) -> Option<&Trail> {
        self.trails.get(ent_num)
    }

    pub fn get_mut(&mut self, ent_num: usize) -> Option<&mut Trail> {
        self.trails.get_mut(ent_num)
    }

    /// CG_ResetTrail
    ///
    /// Collapse the whole chain onto `origin` and set the drawing
    /// parameters. A missing color means white.
    pub fn reset_trail(
        &mut self,
        ent_num: usize,
        origin: &Vec3,
        base_speed: f32,
        width: f32,
        shader: QHandle,
        color: Option<&Vec3>,
    ) {
        let Some(trail) = self.trails.get_mut(ent_num) else {
            log::warn!("CG_ResetTrail: entity {} out of range", ent_num);
            return;
        };

        trail.pos = [*origin; TRAIL_SEGMENTS];
        trail.shader = shader;
        trail.base_speed = base_speed.max(TRAIL_MIN_SPEED);
        trail.width = width;
        trail.color = color.copied().unwrap_or([1.0, 1.0, 1.0]);

        log::trace!("trail {} reset at {:?}", ent_num, origin);
    }

    /// CG_UpdateTrailHead
    pub fn update_trail_head(&mut self, ent_num: usize, origin: &Vec3) {
        let Some(trail) = self.trails.get_mut(ent_num) else {
            log::warn!("CG_UpdateTrailHead: entity {} out of range", ent_num);
            return;
        };
        trail.pos[0] = *origin;
        trail.tangent[0] = [0.0; 3];
    }

    /// CG_LerpTrails
    pub fn lerp_trails(&mut self, cg: &CgFrame, import: &dyn CgameImport) {
        let Self { trails, guided } = self;

        for (ent_num, g) in guided.iter_mut().enumerate() {
            *g = import.entity_flags(ent_num).contains(EF_GUIDED);
        }

        let frametime = cg.frametime;
        let live = trails
            .iter()
            .zip(guided.iter())
            .filter(|(t, g)| t.is_live(**g))
            .count();

        if live >= Self::PARALLEL_TRAIL_THRESHOLD {
            trails
                .par_iter_mut()
                .zip(guided.par_iter())
                .filter(|(t, g)| t.is_live(**g))
                .for_each(|(t, _)| t.relax(frametime));
        } else {
            trails
                .iter_mut()
                .zip(guided.iter())
                .filter(|(t, g)| t.is_live(**g))
                .for_each(|(t, _)| t.relax(frametime));
        }
    }

    /// Submit a ribbon for every live trail. Uses the guided flags from
    /// the last `lerp_trails`.
    pub fn render_trails(&self, cg: &CgFrame, import: &mut dyn CgameImport) {
        for (trail, &g) in self.trails.iter().zip(self.guided.iter()) {
            if trail.is_live(g) {
                render_trail(trail, &cg.vieworg, import);
            }
        }
    }

    /// CG_AddTrailsToScene
    pub fn add_trails_to_scene(&mut self, cg: &CgFrame, import: &mut dyn CgameImport) {
        self.lerp_trails(cg, &*import);
        self.render_trails(cg, import);
    }
}

// ============================================================
// Ribbon geometry
// ============================================================

/// The trailing edge of the next quad is the leading edge of this one.
fn shift_trail_verts(verts: &mut [PolyVert; 4]) {
    verts[3].xyz = verts[0].xyz;
    verts[2].xyz = verts[1].xyz;
    verts[3].st = verts[0].st;
    verts[2].st = verts[1].st;

    // alpha doesn't change, so only copy RGB
    let (lead_plus, lead_minus) = (verts[0].modulate, verts[1].modulate);
    verts[3].modulate[..3].copy_from_slice(&lead_plus[..3]);
    verts[2].modulate[..3].copy_from_slice(&lead_minus[..3]);
}

/// Leading edge of a quad at `point`, `width` either side of the line,
/// perpendicular to the view ray and `tangent`.
fn get_trail_verts(point: &Vec3, tangent: &Vec3, width: f32, vieworg: &Vec3, verts: &mut [PolyVert; 4]) {
    let view_line = vector_subtract(point, vieworg);
    let mut offset = cross_product(&view_line, tangent);

    // looking straight down the tangent gives no width; sample a point
    // nudged up slightly instead
    if vector_normalize(&mut offset) == 0.0 {
        let mut dummy = *point;
        dummy[2] += 0.1;
        let view_line = vector_subtract(&dummy, vieworg);
        offset = cross_product(&view_line, tangent);
        vector_normalize(&mut offset);
    }

    verts[0].xyz = vector_ma(point, width, &offset);
    verts[1].xyz = vector_ma(point, -width, &offset);
}

fn render_trail(trail: &Trail, vieworg: &Vec3, import: &mut dyn CgameImport) {
    let mut verts = [PolyVert::default(); 4];
    verts[0].st[1] = 1.0;
    verts[1].st[1] = 0.0;
    verts[2].st[1] = 0.0;
    verts[3].st[1] = 1.0;

    let rgb = trail.color.map(|c| (c * 255.0) as u8);
    for v in verts.iter_mut() {
        v.modulate = [rgb[0], rgb[1], rgb[2], 255];
    }

    let last = TRAIL_SEGMENTS - 1;
    let mut blend = trail.tangent[last];
    vector_normalize(&mut blend);
    get_trail_verts(&trail.pos[last], &blend, trail.width, vieworg, &mut verts);
    verts[0].st[0] = 0.0;
    verts[1].st[0] = 0.0;
    shift_trail_verts(&mut verts);

    for i in (0..last).rev() {
        // don't draw this node if it overlaps with the previous one
        if distance(&trail.pos[i + 1], &trail.pos[i]) == 0.0 {
            continue;
        }

        // blend the tangents for a smoother match
        let mut blend = if i == 0 || vector_length(&trail.tangent[i]) == 0.0 {
            trail.tangent[i + 1]
        } else {
            vector_add(&trail.tangent[i], &trail.tangent[i + 1])
        };
        vector_normalize(&mut blend);

        get_trail_verts(&trail.pos[i], &blend, trail.width, vieworg, &mut verts);
        let s = 1.0 - i as f32 / last as f32;
        verts[0].st[0] = s;
        verts[1].st[0] = s;

        import.add_poly_to_scene(trail.shader, &verts);
        shift_trail_verts(&mut verts);
    }
}
