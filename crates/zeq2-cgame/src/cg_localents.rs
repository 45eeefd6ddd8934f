// cg_localents.rs -- every frame, generate renderer commands for locally
// processed entities, like smoke puffs, gibs, shells, etc.
//
// ============================================================
// Pool layout
// ============================================================
// All records live in one fixed Vec allocated at startup. Two index
// lists thread through it:
//
// * the active list, doubly linked through a sentinel, newest at the
//   head and oldest at the tail
// * the free list, singly linked through `next`
//
// A slot's `prev` link is only set while it is active; that is the
// liveness test used by `free_local_entity`.
// ============================================================

use std::f32::consts::PI;

use zeq2_common::bg_misc::{evaluate_trajectory, evaluate_trajectory_delta};
use zeq2_common::q_shared::*;

use crate::cg_local::*;
use crate::cg_public::CgameImport;
use crate::error::{CgError, CgResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Sentinel,
    Slot(usize),
}

#[derive(Debug, Clone, Copy, Default)]
struct LeLink {
    prev: Option<Link>,
    next: Option<Link>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeAction {
    Keep,
    Free,
}

/// Fixed-capacity pool of local entities.
pub struct LocalEntities {
    entities: Vec<LocalEntity>,
    links: Vec<LeLink>,
    /// sentinel.next: newest active entity
    active_head: Link,
    /// sentinel.prev: oldest active entity
    active_tail: Link,
    free: Option<usize>,
}

impl Default for LocalEntities {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalEntities {
    pub fn new() -> Self {
        Self::with_capacity(MAX_LOCAL_ENTITIES)
    }

    /// A pool of `capacity` slots (at least one). No allocation happens
    /// after this.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut les = Self {
            entities: vec![LocalEntity::default(); capacity],
            links: vec![LeLink::default(); capacity],
            active_head: Link::Sentinel,
            active_tail: Link::Sentinel,
            free: None,
        };
        les.init();
        les
    }

    /// CG_InitLocalEntities: called at startup and for tournament restarts.
    pub fn init(&mut self) {
        let capacity = self.entities.len();
        self.entities.fill(LocalEntity::default());
        for (i, link) in self.links.iter_mut().enumerate() {
            *link = LeLink {
                prev: None,
                next: (i + 1 < capacity).then_some(Link::Slot(i + 1)),
            };
        }
        self.active_head = Link::Sentinel;
        self.active_tail = Link::Sentinel;
        self.free = Some(0);
        log::debug!("CG_InitLocalEntities: {} slots", capacity);
    }

    pub fn capacity(&self) -> usize {
        self.entities.len()
    }

    pub fn is_active(&self, idx: usize) -> bool {
        self.links.get(idx).is_some_and(|l| l.prev.is_some())
    }

    /// Active entity in slot `idx`.
    pub fn get(&self, idx: usize) -> Option<&LocalEntity> {
        if self.is_active(idx) {
            Some(&self.entities[idx])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut LocalEntity> {
        if self.is_active(idx) {
            Some(&mut self.entities[idx])
        } else {
            None
        }
    }

    /// Active slots, newest first.
    pub fn active(&self) -> impl Iterator<Item = usize> + '_ {
        let first = match self.active_head {
            Link::Slot(i) => Some(i),
            Link::Sentinel => None,
        };
        std::iter::successors(first, move |&i| match self.links[i].next {
            Some(Link::Slot(n)) => Some(n),
            _ => None,
        })
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    pub fn free_count(&self) -> usize {
        std::iter::successors(self.free, |&i| match self.links[i].next {
            Some(Link::Slot(n)) => Some(n),
            _ => None,
        })
        .count()
    }

    fn set_next(&mut self, link: Link, to: Link) {
        match link {
            Link::Sentinel => self.active_head = to,
            Link::Slot(i) => self.links[i].next = Some(to),
        }
    }

    fn set_prev(&mut self, link: Link, to: Link) {
        match link {
            Link::Sentinel => self.active_tail = to,
            Link::Slot(i) => self.links[i].prev = Some(to),
        }
    }

    /// Move an active slot onto the free list. The caller has checked
    /// that `idx` is active.
    fn unlink_active(&mut self, idx: usize) {
        let LeLink { prev: Some(prev), next: Some(next) } = self.links[idx] else {
            return;
        };

        // remove from the doubly linked active list
        self.set_next(prev, next);
        self.set_prev(next, prev);

        // the free list is only singly linked
        self.links[idx] = LeLink {
            prev: None,
            next: self.free.map(Link::Slot),
        };
        self.free = Some(idx);
    }

    /// CG_FreeLocalEntity
    pub fn free_local_entity(&mut self, idx: usize) -> CgResult<()> {
        if idx >= self.capacity() {
            log::error!("CG_FreeLocalEntity: slot {} out of range", idx);
            return Err(CgError::BadHandle { index: idx });
        }
        if self.links[idx].prev.is_none() {
            log::error!("CG_FreeLocalEntity: slot {} not active", idx);
            return Err(CgError::FreeInactive { index: idx });
        }
        self.unlink_active(idx);
        Ok(())
    }

    /// CG_AllocLocalEntity
    ///
    /// Will always succeed, even if it requires freeing an old active
    /// entity. The returned record is zeroed and is the newest entry of
    /// the active list.
    pub fn alloc_local_entity(&mut self) -> usize {
        if self.free.is_none() {
            // no free entities, so free the one at the end of the chain
            // remove the oldest active entity
            if let Link::Slot(oldest) = self.active_tail {
                log::debug!("CG_AllocLocalEntity: evicting slot {}", oldest);
                self.unlink_active(oldest);
            }
        }

        let Some(idx) = self.free else {
            unreachable!("local entity pool has no slots");
        };
        self.free = match self.links[idx].next {
            Some(Link::Slot(n)) => Some(n),
            _ => None,
        };

        self.entities[idx] = LocalEntity::default();

        // link into the active list
        let old_head = self.active_head;
        self.links[idx] = LeLink {
            prev: Some(Link::Sentinel),
            next: Some(old_head),
        };
        self.set_prev(old_head, Link::Slot(idx));
        self.active_head = Link::Slot(idx);
        idx
    }

    /// Allocate for a raw effect tag, as carried by spawn requests that
    /// did not originate in this module.
    pub fn alloc_local_entity_of_type(&mut self, le_type: i32) -> CgResult<usize> {
        let le_type = LeType::try_from(le_type).map_err(|e| {
            log::error!("{}", e);
            e
        })?;
        let idx = self.alloc_local_entity();
        self.entities[idx].kind = LeKind::from_type(le_type);
        Ok(idx)
    }

    // ============================================================
    // CG_AddLocalEntities
    // ============================================================

    /// Run every active entity for this frame and free the expired ones.
    ///
    /// The list is walked from the oldest entry toward the newest, so
    /// entities spawned during the pass are still reached this frame.
    pub fn add_local_entities(
        &mut self,
        cg: &CgFrame,
        cvars: &CgCvars,
        media: &CgMedia,
        import: &mut dyn CgameImport,
    ) -> CgResult<()> {
        let mut cursor = self.active_tail;
        while let Link::Slot(idx) = cursor {
            // grab next now, so if the local entity is freed we
            // still have it
            let Some(prev) = self.links[idx].prev else {
                log::error!("CG_AddLocalEntities: slot {} on the active list is free", idx);
                return Err(CgError::FreeInactive { index: idx });
            };
            cursor = prev;

            if cg.time >= self.entities[idx].end_time {
                self.free_local_entity(idx)?;
                continue;
            }

            let action = add_local_entity(&mut self.entities[idx], cg, cvars, media, import);
            if action == LeAction::Free {
                log::trace!("local entity {} terminated early", idx);
                self.free_local_entity(idx)?;
            }
        }
        Ok(())
    }
}

fn add_local_entity(
    le: &mut LocalEntity,
    cg: &CgFrame,
    cvars: &CgCvars,
    media: &CgMedia,
    import: &mut dyn CgameImport,
) -> LeAction {
    match le.kind {
        LeKind::Mark => {}
        LeKind::SpriteExplosion => add_sprite_explosion(le, cg, import),
        LeKind::Explosion => add_explosion(le, cg, import),
        LeKind::ZeqExplosion => {
            if cg.time >= le.start_time {
                add_zeq_explosion(le, cg, cvars, import);
            }
        }
        LeKind::ZeqSmoke { .. } => {
            if cg.time >= le.start_time {
                add_move_scale_fade(le, cg, import);
            }
        }
        LeKind::ZeqSplash => {
            if cg.time >= le.start_time {
                add_zeq_splash(le, cg, import);
            }
        }
        LeKind::StraightBeamFade => add_straight_beam_fade(le, cg, import),
        LeKind::Fragment { .. } => return add_fragment(le, cg, cvars, import), // gibs and brass
        LeKind::MoveScaleFade { .. } => add_move_scale_fade(le, cg, import), // water bubbles
        LeKind::FadeRgb => add_fade_rgb(le, cg, import),                     // teleporters, railtrails
        LeKind::FadeAlpha => add_fade_alpha(le, cg, import),
        LeKind::FallScaleFade { .. } => add_fall_scale_fade(le, cg, import), // gib blood trails
        LeKind::ScaleFade => add_scale_fade(le, cg, import),                 // rocket trails
        LeKind::ScaleFadeRgb => add_scale_fade_rgb(le, cg, import),
        LeKind::ScorePlum { .. } => return add_score_plum(le, cg, media, import),
        LeKind::FadeNo => add_fade_no(le, cg, import),
    }
    LeAction::Keep
}

// ============================================================
// Shared envelopes
// ============================================================

/// Remaining-life fraction: 1 at spawn, 0 at expiry.
fn remaining(le: &LocalEntity, time: i32) -> f32 {
    (le.end_time - time) as f32 * le.life_rate
}

/// Elapsed-life fraction: 0 at spawn, 1 at expiry.
fn elapsed(le: &LocalEntity, time: i32) -> f32 {
    (time - le.start_time) as f32 / (le.end_time - le.start_time) as f32
}

/// Full for the first half of life, linear to zero over the second.
fn hold_then_fade(frac: f32) -> f32 {
    if frac < 0.5 {
        1.0
    } else {
        1.0 - (frac - 0.5) * 2.0
    }
}

/// Linear up over the first half of life, linear down over the second.
fn ramp_up_down(frac: f32) -> f32 {
    if frac < 0.5 {
        frac * 2.0
    } else {
        1.0 - (frac - 0.5) * 2.0
    }
}

fn add_fading_light(le: &LocalEntity, origin: &Vec3, time: i32, import: &mut dyn CgameImport) {
    if let Some(light) = le.light {
        let intensity = light.intensity * hold_then_fade(elapsed(le, time));
        import.add_light_to_scene(origin, intensity, &light.color);
    }
}

fn scale_axes(axis: &mut [Vec3; 3], scale: f32) {
    for a in axis.iter_mut() {
        *a = vector_scale(a, scale);
    }
}

// ============================================================
// FRAGMENT PROCESSING
//
// A fragment local entity interacts with the environment in some
// way (hitting walls).
// ============================================================

/// CG_ReflectVelocity
fn reflect_velocity(pos: &mut Trajectory, bounce_factor: f32, trace: &Trace, cg: &CgFrame, stop_speed: f32) {
    // reflect the velocity on the trace plane
    let hit_time = cg.time - cg.frametime + (cg.frametime as f32 * trace.fraction) as i32;
    let velocity = evaluate_trajectory_delta(pos, hit_time);
    let dot = dot_product(&velocity, &trace.plane.normal);
    let reflected = vector_ma(&velocity, -2.0 * dot, &trace.plane.normal);

    pos.tr_delta = vector_scale(&reflected, bounce_factor);
    pos.tr_base = trace.endpos;
    pos.tr_time = cg.time;

    // check for stop
    if trace.allsolid || (trace.plane.normal[2] > 0.0 && pos.tr_delta[2] < stop_speed) {
        pos.tr_type = TrType::Stationary;
    }
}

/// CG_AddFragment
fn add_fragment(le: &mut LocalEntity, cg: &CgFrame, cvars: &CgCvars, import: &mut dyn CgameImport) -> LeAction {
    let LeKind::Fragment { pos, angles, bounce_factor, bounce_sound } = &mut le.kind else {
        return LeAction::Keep;
    };

    if pos.tr_type == TrType::Stationary {
        // sink into the ground if near the removal time
        let t = le.end_time - cg.time;
        let mut re = le.refent;
        if t < SINK_TIME {
            // we must use an explicit lighting origin, otherwise the
            // lighting would be lost as soon as the origin went
            // into the ground
            re.lighting_origin = re.origin;
            re.renderfx |= RF_LIGHTING_ORIGIN;
            re.origin[2] -= SINK_DEPTH * (1.0 - t as f32 / SINK_TIME as f32);
        }
        import.add_ref_entity_to_scene(&re);
        return LeAction::Keep;
    }

    // calculate new position
    let new_origin = evaluate_trajectory(pos, cg.time);

    // trace a line from previous position to new position
    let trace = import.trace(&le.refent.origin, &new_origin, CONTENTS_SOLID);
    if trace.fraction == 1.0 {
        // still in free fall
        le.refent.origin = new_origin;

        if le.flags.contains(LeFlags::TUMBLE) {
            let a = evaluate_trajectory(angles, cg.time);
            le.refent.axis = angles_to_axis(&a);
        }

        import.add_ref_entity_to_scene(&le.refent);

        // add a blood trail
        if *bounce_sound == LeBounceSound::Blood {
            import.blood_trail(&le.refent.origin);
        }
        return LeAction::Keep;
    }

    // if it is in a nodrop zone, remove it
    // this keeps gibs from waiting at the bottom of pits of death
    // and floating levels
    if import.point_contents(&trace.endpos).contains(CONTENTS_NODROP) {
        return LeAction::Free;
    }

    // leave a mark
    import.fragment_bounce_mark(*bounce_sound, &trace);

    // do a bouncy sound
    import.fragment_bounce_sound(*bounce_sound, &trace);

    reflect_velocity(pos, *bounce_factor, &trace, cg, cvars.fragment_stop_speed);

    import.add_ref_entity_to_scene(&le.refent);
    LeAction::Keep
}

// ============================================================
// TRIVIAL LOCAL ENTITIES
//
// These only do simple scaling or modulation before passing to
// the renderer.
// ============================================================

/// CG_AddFadeNo
fn add_fade_no(le: &LocalEntity, cg: &CgFrame, import: &mut dyn CgameImport) {
    let mut re = le.refent;
    for i in 0..3 {
        re.shader_rgba[i] = (le.color[i] * 255.0) as u8;
    }
    import.add_ref_entity_to_scene(&re);
    add_fading_light(le, &re.origin, cg.time, import);
}

/// CG_AddFadeRGB
fn add_fade_rgb(le: &LocalEntity, cg: &CgFrame, import: &mut dyn CgameImport) {
    let mut re = le.refent;
    let c = remaining(le, cg.time) * 255.0;
    for i in 0..3 {
        re.shader_rgba[i] = (le.color[i] * c) as u8;
    }
    import.add_ref_entity_to_scene(&re);
}

/// CG_AddFadeAlpha
fn add_fade_alpha(le: &LocalEntity, cg: &CgFrame, import: &mut dyn CgameImport) {
    let mut re = le.refent;
    let c = remaining(le, cg.time) * 255.0;
    re.shader_rgba[3] = (le.color[3] * c) as u8;
    import.add_ref_entity_to_scene(&re);
}

/// CG_AddMoveScaleFade: also drives delayed smoke.
fn add_move_scale_fade(le: &LocalEntity, cg: &CgFrame, import: &mut dyn CgameImport) {
    let (pos, fade_in_time) = match le.kind {
        LeKind::MoveScaleFade { pos, fade_in_time } | LeKind::ZeqSmoke { pos, fade_in_time } => (pos, fade_in_time),
        _ => return,
    };
    let mut re = le.refent;

    let c = if fade_in_time > le.start_time && cg.time < fade_in_time {
        // fade / grow time
        1.0 - (fade_in_time - cg.time) as f32 / (fade_in_time - le.start_time) as f32
    } else {
        // fade / grow time
        remaining(le, cg.time)
    };

    re.shader_rgba[3] = (255.0 * c * le.color[3]) as u8;

    if !le.flags.contains(LeFlags::PUFF_DONT_SCALE) {
        re.radius = le.radius * (1.0 - c) + 8.0;
    }

    re.origin = evaluate_trajectory(&pos, cg.time);

    import.add_ref_entity_to_scene(&re);
}

/// CG_AddScaleFade
///
/// For rocket smokes that hang in place and fade out. There are often
/// many of these, so it needs to be simple.
fn add_scale_fade(le: &LocalEntity, cg: &CgFrame, import: &mut dyn CgameImport) {
    let mut re = le.refent;

    // fade / grow time
    let c = remaining(le, cg.time);

    re.shader_rgba[3] = (255.0 * c * le.color[3]) as u8;
    re.radius = le.radius * (1.0 - c) + 8.0;

    import.add_ref_entity_to_scene(&re);
}

fn add_scale_fade_rgb(le: &LocalEntity, cg: &CgFrame, import: &mut dyn CgameImport) {
    let mut re = le.refent;

    let c = remaining(le, cg.time);

    for i in 0..3 {
        re.shader_rgba[i] = (255.0 * c * le.color[i]) as u8;
    }
    re.radius = le.radius * (1.0 - c) + 8.0;

    import.add_ref_entity_to_scene(&re);
}

/// CG_AddFallScaleFade
///
/// An optimized move-scale-fade for blood mists that drift down and
/// fade out. There are often 100+ of these, so the descent is computed
/// directly instead of through the trajectory evaluator.
fn add_fall_scale_fade(le: &LocalEntity, cg: &CgFrame, import: &mut dyn CgameImport) {
    let LeKind::FallScaleFade { base_z, drop } = le.kind else {
        return;
    };
    let mut re = le.refent;

    // fade time
    let c = remaining(le, cg.time);

    re.shader_rgba[3] = (255.0 * c * le.color[3]) as u8;
    re.origin[2] = base_z - (1.0 - c) * drop;
    re.radius = le.radius * (1.0 - c) + 16.0;

    import.add_ref_entity_to_scene(&re);
}

/// CG_AddExplosion
fn add_explosion(le: &LocalEntity, cg: &CgFrame, import: &mut dyn CgameImport) {
    import.add_ref_entity_to_scene(&le.refent);
    add_fading_light(le, &le.refent.origin, cg.time, import);
}

/// CG_AddStraightBeamFade
///
/// The far end (`origin`) slides back toward `oldorigin` while the
/// beam thins and darkens.
fn add_straight_beam_fade(le: &LocalEntity, cg: &CgFrame, import: &mut dyn CgameImport) {
    let re = &le.refent;

    let scale_l = 1.0 - elapsed(le, cg.time);
    let scale_w = scale_l.max(0.0);

    let grey = (scale_l * 255.0) as u8;
    let rgba = [grey, grey, grey, grey];

    let direction = vector_scale(&vector_subtract(&re.origin, &re.oldorigin), scale_l);
    let start = vector_add(&re.oldorigin, &direction);

    import.add_line_to_scene(&start, &re.oldorigin, le.radius * scale_w, re.custom_shader, rgba);
}

/// CG_AddZEQExplosion
fn add_zeq_explosion(le: &LocalEntity, cg: &CgFrame, cvars: &CgCvars, import: &mut dyn CgameImport) {
    let mut re = le.refent;
    let frac = elapsed(le, cg.time);

    let fade = (255.0 * hold_then_fade(frac)) as u8;
    re.shader_rgba = [fade; 4];

    // grow time
    let phase = frac * PI / 2.0;
    let c = 1.0 + phase.sin();
    scale_axes(&mut re.axis, 1.0 - c);

    if cvars.draw_bbox {
        let (mins, maxs) = import.model_bounds(re.hmodel, re.frame);
        let mins = vector_scale(&mins, re.radius * (1.0 - c));
        let maxs = vector_scale(&maxs, re.radius * (1.0 - c));
        import.add_debug_box(&re.origin, &mins, &maxs);
    }

    import.add_ref_entity_to_scene(&re);

    if let Some(light) = le.light {
        let env = ramp_up_down(frac);
        import.add_light_to_scene(&re.origin, light.intensity * env, &vector_scale(&light.color, env));
    }
}

/// CG_AddZEQSplash
fn add_zeq_splash(le: &LocalEntity, cg: &CgFrame, import: &mut dyn CgameImport) {
    let mut re = le.refent;

    re.shader_rgba[3] = (255.0 * hold_then_fade(elapsed(le, cg.time))) as u8;

    // grow time
    let c = remaining(le, cg.time) / 1.1;
    scale_axes(&mut re.axis, 1.0 - c);

    import.add_ref_entity_to_scene(&re);
}

/// CG_AddSpriteExplosion
fn add_sprite_explosion(le: &LocalEntity, cg: &CgFrame, import: &mut dyn CgameImport) {
    let mut re = le.refent;

    // can exceed 1 during connection problems
    let c = ((le.end_time - cg.time) as f32 / (le.end_time - le.start_time) as f32).min(1.0);

    re.shader_rgba = [0xff, 0xff, 0xff, (255.0 * c * 0.33) as u8];
    re.re_type = RefType::Sprite;
    re.radius = 42.0 * (1.0 - c) + 30.0;

    import.add_ref_entity_to_scene(&re);
    add_fading_light(le, &re.origin, cg.time, import);
}

// ============================================================
// Score plums
// ============================================================

/// Decimal digits of `score`, least significant first, with the minus
/// glyph appended for negative values.
pub fn score_plum_digits(score: i32) -> ([usize; 11], usize) {
    let mut digits = [0usize; 11];
    let mut value = score.unsigned_abs();
    let mut numdigits = 0;
    loop {
        digits[numdigits] = (value % 10) as usize;
        value /= 10;
        numdigits += 1;
        if value == 0 {
            break;
        }
    }
    if score < 0 {
        digits[numdigits] = STAT_MINUS;
        numdigits += 1;
    }
    (digits, numdigits)
}

fn score_plum_color(score: i32) -> [u8; 3] {
    if score < 0 {
        return [0xff, 0x11, 0x11];
    }
    let mut rgb = [0xff; 3];
    if score >= 50 {
        rgb[1] = 0;
    } else if score >= 20 {
        rgb[0] = 0;
        rgb[1] = 0;
    } else if score >= 10 {
        rgb[2] = 0;
    } else if score >= 2 {
        rgb[0] = 0;
        rgb[2] = 0;
    }
    rgb
}

/// CG_AddScorePlum
fn add_score_plum(le: &LocalEntity, cg: &CgFrame, media: &CgMedia, import: &mut dyn CgameImport) -> LeAction {
    let LeKind::ScorePlum { score, base } = le.kind else {
        return LeAction::Keep;
    };
    let mut re = le.refent;

    let c = remaining(le, cg.time);

    let [r, g, b] = score_plum_color(score);
    let a = if c < 0.25 { (255.0 * 4.0 * c) as u8 } else { 0xff };
    re.shader_rgba = [r, g, b, a];
    re.radius = NUMBER_SIZE / 2.0;

    let mut origin = base;
    origin[2] += 110.0 - c * 100.0;

    let dir = vector_subtract(&cg.vieworg, &origin);
    let mut vec = cross_product(&dir, &[0.0, 0.0, 1.0]);
    vector_normalize(&mut vec);

    let origin = vector_ma(&origin, -10.0 + 20.0 * (c * 2.0 * PI).sin(), &vec);

    // if the view would be "inside" the sprite, kill the sprite
    // so it doesn't add too much overdraw
    let len = vector_length(&vector_subtract(&origin, &cg.vieworg));
    if len < SCORE_PLUM_MIN_DIST {
        return LeAction::Free;
    }

    let (digits, numdigits) = score_plum_digits(score);
    let half = (numdigits - 1) as f32 / 2.0;
    for i in 0..numdigits {
        re.origin = vector_ma(&origin, (half - i as f32) * NUMBER_SIZE, &vec);
        re.custom_shader = media.number_shaders[digits[numdigits - 1 - i]];
        import.add_ref_entity_to_scene(&re);
    }
    LeAction::Keep
}

// ============================================================
// Tests
// ============================================================
