// cg_effects.rs -- these functions generate localentities, usually as a
// result of event processing

use zeq2_common::common::{crand, frand, rand_i32};
use zeq2_common::q_shared::*;

use crate::cg_local::*;
use crate::cg_localents::LocalEntities;
use crate::error::{CgError, CgResult};

/// Gibs and brass live this long plus up to `FRAGMENT_LIFE_JITTER` more.
pub const FRAGMENT_LIFE: i32 = 5000;
pub const FRAGMENT_LIFE_JITTER: f32 = 3000.0;
pub const SCORE_PLUM_LIFE: i32 = 4000;

impl LocalEntities {
    /// CG_SmokePuff
    ///
    /// Adds a smoke puff or blood trail localEntity. With a `fade_in_time`
    /// after `start_time` the puff grows in before it fades.
    pub fn smoke_puff(
        &mut self,
        p: &Vec3,
        vel: &Vec3,
        radius: f32,
        color: Vec4,
        duration: i32,
        start_time: i32,
        fade_in_time: i32,
        le_flags: LeFlags,
        shader: QHandle,
    ) -> usize {
        let idx = self.alloc_local_entity();
        let Some(le) = self.get_mut(idx) else {
            return idx;
        };

        le.flags = le_flags;
        le.radius = radius;
        le.color = color;
        le.set_lifetime(start_time, start_time.saturating_add(duration));
        if fade_in_time > start_time {
            le.life_rate = 1.0 / (i64::from(le.end_time) - i64::from(fade_in_time)).max(1) as f32;
        }

        le.kind = LeKind::MoveScaleFade {
            pos: Trajectory {
                tr_type: TrType::Linear,
                tr_time: start_time,
                tr_base: *p,
                tr_delta: *vel,
                ..Default::default()
            },
            fade_in_time,
        };

        let re = &mut le.refent;
        re.rotation = frand() * 360.0;
        re.radius = radius;
        re.shader_time = start_time as f32 / 1000.0;
        re.origin = *p;
        re.custom_shader = shader;
        re.re_type = RefType::Sprite;
        re.shader_rgba = color.map(|c| (c * 255.0) as u8);

        idx
    }

    /// CG_MakeExplosion
    ///
    /// A model explosion, or a camera facing sprite pushed 16 units off
    /// the surface along `dir`. The start is backdated a few ms at random
    /// so simultaneous explosions don't animate in lockstep.
    pub fn make_explosion(
        &mut self,
        cg: &CgFrame,
        origin: &Vec3,
        dir: Option<&Vec3>,
        model: QHandle,
        shader: QHandle,
        msec: i32,
        is_sprite: bool,
        light: Option<LeLight>,
    ) -> CgResult<usize> {
        if msec <= 0 {
            log::error!("CG_MakeExplosion: msec = {}", msec);
            return Err(CgError::BadDuration { msec });
        }

        // skew the time a bit so they aren't all in sync
        let offset = rand_i32() & 63;

        let idx = self.alloc_local_entity();
        let Some(ex) = self.get_mut(idx) else {
            return Ok(idx);
        };

        let mut new_origin = *origin;
        if is_sprite {
            ex.kind = LeKind::SpriteExplosion;

            // randomly rotate sprite orientation
            ex.refent.rotation = (rand_i32() % 360) as f32;
            if let Some(dir) = dir {
                new_origin = vector_ma(origin, 16.0, dir);
            }
        } else {
            ex.kind = LeKind::Explosion;

            // set axis with random rotate
            ex.refent.axis = match dir {
                Some(_) => angles_to_axis(&[0.0, (rand_i32() % 360) as f32, 0.0]),
                None => axis_clear(),
            };
        }

        let start_time = cg.time.saturating_sub(offset);
        ex.set_lifetime(start_time, start_time.saturating_add(msec));
        ex.light = light;
        ex.color = [1.0, 1.0, 1.0, 1.0];

        ex.refent.shader_time = ex.start_time as f32 / 1000.0;
        ex.refent.hmodel = model;
        ex.refent.custom_shader = shader;
        ex.refent.origin = new_origin;
        ex.refent.oldorigin = new_origin;

        Ok(idx)
    }

    /// A large model explosion that waits for `start_time` and squashes
    /// in, with an optional light that swells and dies with it.
    pub fn zeq_explosion(
        &mut self,
        origin: &Vec3,
        model: QHandle,
        shader: QHandle,
        start_time: i32,
        duration: i32,
        radius: f32,
        light: Option<LeLight>,
    ) -> usize {
        let idx = self.alloc_local_entity();
        if let Some(le) = self.get_mut(idx) {
            le.kind = LeKind::ZeqExplosion;
            le.set_lifetime(start_time, start_time.saturating_add(duration));
            le.color = [1.0, 1.0, 1.0, 1.0];
            le.light = light;
            le.radius = radius;

            le.refent.hmodel = model;
            le.refent.custom_shader = shader;
            le.refent.origin = *origin;
            le.refent.oldorigin = *origin;
            le.refent.axis = axis_clear();
            le.refent.radius = radius;
            le.refent.shader_time = start_time as f32 / 1000.0;
        }
        idx
    }

    /// CG_LaunchGib / CG_LaunchBrass
    ///
    /// A bouncing fragment under gravity. Tumbling fragments also get a
    /// random angular velocity.
    pub fn spawn_fragment(
        &mut self,
        cg: &CgFrame,
        origin: &Vec3,
        velocity: &Vec3,
        model: QHandle,
        bounce_factor: f32,
        bounce_sound: LeBounceSound,
        tumble: bool,
    ) -> usize {
        let idx = self.alloc_local_entity();
        let Some(le) = self.get_mut(idx) else {
            return idx;
        };

        let life = FRAGMENT_LIFE + (frand() * FRAGMENT_LIFE_JITTER) as i32;
        le.set_lifetime(cg.time, cg.time.saturating_add(life));

        let angles = if tumble {
            le.flags |= LeFlags::TUMBLE;
            Trajectory {
                tr_type: TrType::Linear,
                tr_time: cg.time,
                tr_delta: [crand() * 500.0, crand() * 500.0, crand() * 500.0],
                ..Default::default()
            }
        } else {
            Trajectory::default()
        };

        le.kind = LeKind::Fragment {
            pos: Trajectory {
                tr_type: TrType::Gravity,
                tr_time: cg.time,
                tr_base: *origin,
                tr_delta: *velocity,
                ..Default::default()
            },
            angles,
            bounce_factor,
            bounce_sound,
        };

        le.refent.origin = *origin;
        le.refent.hmodel = model;
        le.refent.axis = axis_clear();

        idx
    }

    /// CG_ScorePlum
    pub fn score_plum(&mut self, cg: &CgFrame, origin: &Vec3, score: i32) -> usize {
        let idx = self.alloc_local_entity();
        if let Some(le) = self.get_mut(idx) {
            le.kind = LeKind::ScorePlum { score, base: *origin };
            le.set_lifetime(cg.time, cg.time.saturating_add(SCORE_PLUM_LIFE));
            le.color = [1.0, 1.0, 1.0, 1.0];
            le.radius = score as f32;
            le.refent.re_type = RefType::Sprite;
            le.refent.origin = *origin;
        }
        idx
    }

    /// A flat beam from `start` to `end` that retracts toward `start`
    /// and thins out over `duration` ms.
    pub fn straight_beam(
        &mut self,
        cg: &CgFrame,
        start: &Vec3,
        end: &Vec3,
        width: f32,
        shader: QHandle,
        duration: i32,
    ) -> usize {
        let idx = self.alloc_local_entity();
        if let Some(le) = self.get_mut(idx) {
            le.kind = LeKind::StraightBeamFade;
            le.set_lifetime(cg.time, cg.time.saturating_add(duration));
            le.radius = width;
            le.color = [1.0, 1.0, 1.0, 1.0];
            le.refent.re_type = RefType::Beam;
            le.refent.origin = *end;
            le.refent.oldorigin = *start;
            le.refent.custom_shader = shader;
        }
        idx
    }

    /// Generic constructor for the payload-free fades, keyed by the raw
    /// effect tag a spawn request carries. Only `FadeRgb`, `FadeAlpha`,
    /// `FadeNo`, `ScaleFade` and `ScaleFadeRgb` are accepted; anything else
    /// is `BadLeType` and nothing is allocated.
    pub fn fade_effect(
        &mut self,
        le_type: i32,
        re: &RefEntity,
        color: Vec4,
        radius: f32,
        start_time: i32,
        duration: i32,
    ) -> CgResult<usize> {
        let kind = LeType::try_from(le_type).map_err(|e| {
            log::error!("{}", e);
            e
        })?;
        if !matches!(
            kind,
            LeType::FadeRgb | LeType::FadeAlpha | LeType::FadeNo | LeType::ScaleFade | LeType::ScaleFadeRgb
        ) {
            log::error!("fade_effect: {:?} is not a fade", kind);
            return Err(CgError::BadLeType(le_type));
        }
        let idx = self.alloc_local_entity_of_type(le_type)?;
        if let Some(le) = self.get_mut(idx) {
            le.refent = *re;
            le.color = color;
            le.radius = radius;
            le.set_lifetime(start_time, start_time.saturating_add(duration));
        }
        Ok(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{approx, MockImport};

    fn frame(time: i32) -> CgFrame {
        CgFrame::new(time, 16, [0.0; 3])
    }

    #[test]
    fn test_smoke_puff_setup() {
        let mut les = LocalEntities::with_capacity(4);
        let idx = les.smoke_puff(
            &[1.0, 2.0, 3.0],
            &[0.0, 0.0, 10.0],
            24.0,
            [1.0, 1.0, 1.0, 0.5],
            2000,
            1000,
            0,
            LeFlags::empty(),
            9,
        );
        let le = les.get(idx).unwrap();
        assert_eq!(le.le_type(), LeType::MoveScaleFade);
        assert_eq!((le.start_time, le.end_time), (1000, 3000));
        assert!(approx(le.life_rate, 1.0 / 2000.0));
        assert_eq!(le.refent.re_type, RefType::Sprite);
        assert_eq!(le.refent.custom_shader, 9);
        assert_eq!(le.refent.shader_rgba, [255, 255, 255, 127]);
        assert!((0.0..=360.0).contains(&le.refent.rotation));
        match le.kind {
            LeKind::MoveScaleFade { pos, .. } => {
                assert_eq!(pos.tr_type, TrType::Linear);
                assert_eq!(pos.tr_time, 1000);
                assert_eq!(pos.tr_base, [1.0, 2.0, 3.0]);
            }
            _ => panic!("wrong kind"),
        }
    }

    #[test]
    fn test_smoke_puff_fade_in_rate() {
        let mut les = LocalEntities::with_capacity(4);
        let idx = les.smoke_puff(&[0.0; 3], &[0.0; 3], 8.0, [1.0; 4], 1000, 0, 500, LeFlags::PUFF_DONT_SCALE, 1);
        let le = les.get(idx).unwrap();
        assert!(approx(le.life_rate, 1.0 / 500.0));
        assert!(le.flags.contains(LeFlags::PUFF_DONT_SCALE));
    }

    #[test]
    fn test_make_explosion_backdates_start() {
        let mut les = LocalEntities::with_capacity(4);
        let idx = les
            .make_explosion(&frame(5000), &[0.0; 3], Some(&[0.0, 0.0, 1.0]), 3, 4, 600, false, None)
            .unwrap();
        let le = les.get(idx).unwrap();
        assert_eq!(le.le_type(), LeType::Explosion);
        assert!(le.start_time <= 5000 && le.start_time > 5000 - 64);
        assert_eq!(le.end_time - le.start_time, 600);
        assert_eq!(le.refent.hmodel, 3);
        assert!(approx(vector_length(&le.refent.axis[0]), 1.0));
    }

    #[test]
    fn test_make_sprite_explosion_is_pushed_off_surface() {
        let mut les = LocalEntities::with_capacity(4);
        let light = Some(LeLight { intensity: 300.0, color: [1.0, 0.75, 0.0] });
        let idx = les
            .make_explosion(&frame(5000), &[0.0; 3], Some(&[0.0, 0.0, 1.0]), 0, 4, 600, true, light)
            .unwrap();
        let le = les.get(idx).unwrap();
        assert_eq!(le.le_type(), LeType::SpriteExplosion);
        assert_eq!(le.refent.origin, [0.0, 0.0, 16.0]);
        assert_eq!(le.light, light);
    }

    #[test]
    fn test_make_explosion_rejects_bad_duration() {
        let mut les = LocalEntities::with_capacity(4);
        let result = les.make_explosion(&frame(0), &[0.0; 3], None, 0, 0, 0, false, None);
        assert_eq!(result, Err(CgError::BadDuration { msec: 0 }));
        assert_eq!(les.active_count(), 0);
    }

    #[test]
    fn test_spawned_fragment_falls_and_bounces() {
        let mut les = LocalEntities::with_capacity(4);
        let idx = les.spawn_fragment(
            &frame(0),
            &[0.0, 0.0, 10.0],
            &[0.0, 0.0, -200.0],
            5,
            0.5,
            LeBounceSound::Brass,
            true,
        );
        {
            let le = les.get(idx).unwrap();
            assert!(le.flags.contains(LeFlags::TUMBLE));
            assert!(le.end_time >= FRAGMENT_LIFE && le.end_time <= FRAGMENT_LIFE + 3000);
        }

        let mut import = MockImport::with_floor(0.0);
        let cg = CgFrame::new(100, 100, [0.0; 3]);
        les.add_local_entities(&cg, &CgCvars::default(), &CgMedia::default(), &mut import)
            .unwrap();
        assert_eq!(import.sounds, vec![LeBounceSound::Brass]);
        assert!(les.is_active(idx));
    }

    #[test]
    fn test_score_plum_spawn() {
        let mut les = LocalEntities::with_capacity(4);
        let idx = les.score_plum(&frame(100), &[1.0, 2.0, 3.0], -7);
        let le = les.get(idx).unwrap();
        assert_eq!(le.kind, LeKind::ScorePlum { score: -7, base: [1.0, 2.0, 3.0] });
        assert_eq!(le.end_time, 100 + SCORE_PLUM_LIFE);
    }

    #[test]
    fn test_straight_beam_draws_full_length_at_spawn() {
        let mut les = LocalEntities::with_capacity(4);
        les.straight_beam(&frame(0), &[0.0; 3], &[0.0, 100.0, 0.0], 6.0, 2, 500);
        let mut import = MockImport::new();
        les.add_local_entities(&frame(0), &CgCvars::default(), &CgMedia::default(), &mut import)
            .unwrap();
        let (start, end, width, shader, _) = import.lines[0];
        assert_eq!(start, [0.0, 100.0, 0.0]);
        assert_eq!(end, [0.0; 3]);
        assert_eq!(width, 6.0);
        assert_eq!(shader, 2);
    }

    #[test]
    fn test_zeq_explosion_spawn_is_delayed() {
        let mut les = LocalEntities::with_capacity(4);
        les.zeq_explosion(&[0.0; 3], 1, 2, 1000, 1000, 1.0, None);
        let mut import = MockImport::new();
        les.add_local_entities(&frame(500), &CgCvars::default(), &CgMedia::default(), &mut import)
            .unwrap();
        assert!(import.entities.is_empty());
        les.add_local_entities(&frame(1200), &CgCvars::default(), &CgMedia::default(), &mut import)
            .unwrap();
        assert_eq!(import.entities.len(), 1);
    }

    #[test]
    fn test_fade_effect_by_tag() {
        let mut les = LocalEntities::with_capacity(4);
        let re = RefEntity { hmodel: 12, ..Default::default() };
        let idx = les
            .fade_effect(LeType::FadeAlpha as i32, &re, [1.0, 0.0, 0.0, 1.0], 4.0, 0, 250)
            .unwrap();
        let le = les.get(idx).unwrap();
        assert_eq!(le.le_type(), LeType::FadeAlpha);
        assert_eq!(le.refent.hmodel, 12);
        assert!(approx(le.life_rate, 1.0 / 250.0));

        assert_eq!(les.fade_effect(99, &re, [1.0; 4], 4.0, 0, 250), Err(CgError::BadLeType(99)));
        assert_eq!(les.active_count(), 1);
    }

    #[test]
    fn test_fade_effect_rejects_payload_types() {
        let mut les = LocalEntities::with_capacity(4);
        let re = RefEntity::default();
        for ty in [LeType::ScorePlum, LeType::Fragment, LeType::MoveScaleFade, LeType::FallScaleFade] {
            let tag = ty as i32;
            assert_eq!(les.fade_effect(tag, &re, [1.0; 4], 4.0, 0, 250), Err(CgError::BadLeType(tag)));
        }
        assert_eq!(les.active_count(), 0);

        for ty in [LeType::FadeRgb, LeType::FadeNo, LeType::ScaleFade, LeType::ScaleFadeRgb] {
            let idx = les.fade_effect(ty as i32, &re, [1.0; 4], 4.0, 0, 250).unwrap();
            assert_eq!(les.get(idx).unwrap().le_type(), ty);
        }
    }

    #[test]
    fn test_huge_durations_saturate() {
        let mut les = LocalEntities::with_capacity(8);
        let re = RefEntity::default();
        let a = les.fade_effect(LeType::FadeAlpha as i32, &re, [1.0; 4], 4.0, 1000, i32::MAX).unwrap();
        let b = les.smoke_puff(&[0.0; 3], &[0.0; 3], 8.0, [1.0; 4], i32::MAX, 1000, 0, LeFlags::empty(), 1);
        let c = les.straight_beam(&frame(1000), &[0.0; 3], &[0.0, 0.0, 64.0], 4.0, 1, i32::MAX);
        let d = les.zeq_explosion(&[0.0; 3], 1, 1, 1000, i32::MAX, 32.0, None);
        for idx in [a, b, c, d] {
            let le = les.get(idx).unwrap();
            assert_eq!(le.end_time, i32::MAX);
            assert!(le.life_rate > 0.0);
        }

        let ex = les
            .make_explosion(&frame(i32::MAX - 10), &[0.0; 3], None, 1, 1, 5000, false, None)
            .unwrap();
        assert_eq!(les.get(ex).unwrap().end_time, i32::MAX);

        let cg = frame(i32::MAX - 100);
        let plum = les.score_plum(&cg, &[0.0; 3], 5);
        assert_eq!(les.get(plum).unwrap().end_time, i32::MAX);
    }
}
