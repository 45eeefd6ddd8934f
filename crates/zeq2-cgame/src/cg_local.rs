// cg_local.rs -- cgame-wide types: frame context, media, tunables, local entities

use zeq2_common::cvar::CvarContext;
use zeq2_common::q_shared::*;

use crate::error::CgError;

// ============================================================
// Constants
// ============================================================

pub const MAX_LOCAL_ENTITIES: usize = 8192;

/// Fragments sink into the ground over this many ms before removal.
pub const SINK_TIME: i32 = 1000;
pub const SINK_DEPTH: f32 = 16.0;

/// Width of one score plum digit.
pub const NUMBER_SIZE: f32 = 8.0;
/// Score plums closer than this to the view are removed.
pub const SCORE_PLUM_MIN_DIST: f32 = 20.0;

/// Index of the minus glyph in `CgMedia::number_shaders`.
pub const STAT_MINUS: usize = 10;

// ============================================================
// Per-frame context
// ============================================================

/// The read-only clock and view for one rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CgFrame {
    /// Current client time in milliseconds.
    pub time: i32,
    /// Milliseconds since the previous frame.
    pub frametime: i32,
    pub vieworg: Vec3,
}

impl CgFrame {
    pub fn new(time: i32, frametime: i32, vieworg: Vec3) -> Self {
        Self { time, frametime, vieworg }
    }
}

/// Renderer handles registered at level load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CgMedia {
    /// Digits 0-9 followed by the minus sign.
    pub number_shaders: [QHandle; 11],
}

// ============================================================
// Cvars
// ============================================================

pub const CG_DRAW_BBOX: &str = "cg_drawBBox";
pub const CG_FRAGMENT_STOP_SPEED: &str = "cg_fragmentStopSpeed";

/// Snapshot of the cgame tunables for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CgCvars {
    pub draw_bbox: bool,
    /// A bouncing fragment whose post-bounce vertical speed is below
    /// this comes to rest.
    pub fragment_stop_speed: f32,
}

impl Default for CgCvars {
    fn default() -> Self {
        Self {
            draw_bbox: false,
            fragment_stop_speed: 40.0,
        }
    }
}

impl CgCvars {
    pub fn register(ctx: &mut CvarContext) {
        ctx.get(CG_DRAW_BBOX, "0", CVAR_CHEAT);
        ctx.get(CG_FRAGMENT_STOP_SPEED, "40", CVAR_ARCHIVE);
    }

    pub fn from_context(ctx: &CvarContext) -> Self {
        let defaults = Self::default();
        Self {
            draw_bbox: ctx.find_var(CG_DRAW_BBOX).is_some_and(|v| v.value != 0.0),
            fragment_stop_speed: ctx
                .find_var(CG_FRAGMENT_STOP_SPEED)
                .map_or(defaults.fragment_stop_speed, |v| v.value),
        }
    }
}

// ============================================================
// Local entities
// ============================================================

/// leType_t: the raw tag carried by spawn requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum LeType {
    Mark = 0,
    Explosion,
    SpriteExplosion,
    ZeqExplosion,
    ZeqSmoke,
    ZeqSplash,
    StraightBeamFade,
    Fragment,
    MoveScaleFade,
    FadeRgb,
    FadeAlpha,
    FallScaleFade,
    ScaleFade,
    ScaleFadeRgb,
    ScorePlum,
    FadeNo,
}

impl TryFrom<i32> for LeType {
    type Error = CgError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        use LeType::*;
        const ALL: [LeType; 16] = [
            Mark, Explosion, SpriteExplosion, ZeqExplosion, ZeqSmoke, ZeqSplash,
            StraightBeamFade, Fragment, MoveScaleFade, FadeRgb, FadeAlpha,
            FallScaleFade, ScaleFade, ScaleFadeRgb, ScorePlum, FadeNo,
        ];
        usize::try_from(value)
            .ok()
            .and_then(|i| ALL.get(i).copied())
            .ok_or(CgError::BadLeType(value))
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct LeFlags: i32 {
        const PUFF_DONT_SCALE = 0x0001; // do not scale size over time
        const TUMBLE          = 0x0002; // tumble over time, used for ejecting shells
    }
}

/// What a fragment does when it hits something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeBounceSound {
    #[default]
    None,
    Blood,
    Brass,
}

/// Optional dynamic light carried by an effect.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LeLight {
    pub intensity: f32,
    pub color: Vec3,
}

/// Variant-specific state of a local entity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LeKind {
    #[default]
    Mark,
    Explosion,
    SpriteExplosion,
    /// Large model explosion with sine overshoot growth
    ZeqExplosion,
    ZeqSmoke {
        pos: Trajectory,
        fade_in_time: i32,
    },
    ZeqSplash,
    /// Beam from `refent.oldorigin` to `refent.origin`, width `radius`
    StraightBeamFade,
    /// Gibs and brass
    Fragment {
        pos: Trajectory,
        angles: Trajectory,
        bounce_factor: f32,
        bounce_sound: LeBounceSound,
    },
    MoveScaleFade {
        pos: Trajectory,
        fade_in_time: i32,
    },
    FadeRgb,
    FadeAlpha,
    /// Straight vertical descent of `drop` units from `base_z`
    FallScaleFade {
        base_z: f32,
        drop: f32,
    },
    ScaleFade,
    ScaleFadeRgb,
    ScorePlum {
        score: i32,
        base: Vec3,
    },
    FadeNo,
}

impl LeKind {
    pub fn le_type(&self) -> LeType {
        match self {
            LeKind::Mark => LeType::Mark,
            LeKind::Explosion => LeType::Explosion,
            LeKind::SpriteExplosion => LeType::SpriteExplosion,
            LeKind::ZeqExplosion => LeType::ZeqExplosion,
            LeKind::ZeqSmoke { .. } => LeType::ZeqSmoke,
            LeKind::ZeqSplash => LeType::ZeqSplash,
            LeKind::StraightBeamFade => LeType::StraightBeamFade,
            LeKind::Fragment { .. } => LeType::Fragment,
            LeKind::MoveScaleFade { .. } => LeType::MoveScaleFade,
            LeKind::FadeRgb => LeType::FadeRgb,
            LeKind::FadeAlpha => LeType::FadeAlpha,
            LeKind::FallScaleFade { .. } => LeType::FallScaleFade,
            LeKind::ScaleFade => LeType::ScaleFade,
            LeKind::ScaleFadeRgb => LeType::ScaleFadeRgb,
            LeKind::ScorePlum { .. } => LeType::ScorePlum,
            LeKind::FadeNo => LeType::FadeNo,
        }
    }

    /// Zeroed variant state for a tag.
    pub fn from_type(le_type: LeType) -> Self {
        match le_type {
            LeType::Mark => LeKind::Mark,
            LeType::Explosion => LeKind::Explosion,
            LeType::SpriteExplosion => LeKind::SpriteExplosion,
            LeType::ZeqExplosion => LeKind::ZeqExplosion,
            LeType::ZeqSmoke => LeKind::ZeqSmoke { pos: Trajectory::default(), fade_in_time: 0 },
            LeType::ZeqSplash => LeKind::ZeqSplash,
            LeType::StraightBeamFade => LeKind::StraightBeamFade,
            LeType::Fragment => LeKind::Fragment {
                pos: Trajectory::default(),
                angles: Trajectory::default(),
                bounce_factor: 0.0,
                bounce_sound: LeBounceSound::None,
            },
            LeType::MoveScaleFade => LeKind::MoveScaleFade { pos: Trajectory::default(), fade_in_time: 0 },
            LeType::FadeRgb => LeKind::FadeRgb,
            LeType::FadeAlpha => LeKind::FadeAlpha,
            LeType::FallScaleFade => LeKind::FallScaleFade { base_z: 0.0, drop: 0.0 },
            LeType::ScaleFade => LeKind::ScaleFade,
            LeType::ScaleFadeRgb => LeKind::ScaleFadeRgb,
            LeType::ScorePlum => LeKind::ScorePlum { score: 0, base: [0.0; 3] },
            LeType::FadeNo => LeKind::FadeNo,
        }
    }
}

/// localEntity_t: one pooled, client-only visual effect.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalEntity {
    pub kind: LeKind,
    pub flags: LeFlags,

    pub start_time: i32,
    pub end_time: i32,
    /// 1.0 / (end_time - start_time)
    pub life_rate: f32,

    pub color: Vec4,
    pub radius: f32,
    pub light: Option<LeLight>,

    pub refent: RefEntity,
}

impl LocalEntity {
    pub fn le_type(&self) -> LeType {
        self.kind.le_type()
    }

    /// Set the lifetime window and the matching `life_rate`.
    pub fn set_lifetime(&mut self, start_time: i32, end_time: i32) {
        self.start_time = start_time;
        self.end_time = end_time;
        self.life_rate = if end_time != start_time {
            1.0 / (i64::from(end_time) - i64::from(start_time)) as f32
        } else {
            0.0
        };
    }
}
