// q_shared.rs -- foundational types and functions shared by the cgame and its collaborators

// ============================================================
// Basic types
// ============================================================

pub type Vec3 = [f32; 3];
pub type Vec4 = [f32; 4];

/// Renderer asset handle (shader, model, skin). 0 means "none".
pub type QHandle = i32;

// Angle indexes
pub const PITCH: usize = 0; // up / down
pub const YAW: usize = 1; // left / right
pub const ROLL: usize = 2; // fall over

/// Number of entity slots the server can replicate to a client.
pub const MAX_GENTITIES: usize = 1024;

pub const DEFAULT_GRAVITY: f32 = 800.0;

// ============================================================
// Cvar flags
// ============================================================

pub const CVAR_ARCHIVE: i32 = 1;
pub const CVAR_NOSET: i32 = 8;
pub const CVAR_CHEAT: i32 = 16;

// ============================================================
// Content flags
// ============================================================

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Contents: u32 {
        const SOLID         = 0x00000001;
        const LAVA          = 0x00000008;
        const SLIME         = 0x00000010;
        const WATER         = 0x00000020;
        const FOG           = 0x00000040;
        const AREAPORTAL    = 0x00008000;
        const PLAYERCLIP    = 0x00010000;
        const MONSTERCLIP   = 0x00020000;
        const TELEPORTER    = 0x00040000;
        const JUMPPAD       = 0x00080000;
        const CLUSTERPORTAL = 0x00100000;
        const DONOTENTER    = 0x00200000;
        const ORIGIN        = 0x01000000;
        const BODY          = 0x02000000;
        const CORPSE        = 0x04000000;
        const DETAIL        = 0x08000000;
        const STRUCTURAL    = 0x10000000;
        const TRANSLUCENT   = 0x20000000;
        const TRIGGER       = 0x40000000;
        const NODROP        = 0x80000000; // don't leave bodies or items (death fog, lava)
    }
}
pub const CONTENTS_SOLID: Contents = Contents::SOLID;
pub const CONTENTS_NODROP: Contents = Contents::NODROP;

// ============================================================
// Entity state flags (replicated)
// ============================================================

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct EntityFlags: u32 {
        const DEAD         = 0x00000001;
        const TELEPORT_BIT = 0x00000004;
        const NODRAW       = 0x00000080;
        const FIRING       = 0x00000100;
        /// Steered projectile; may loop back over its own trail.
        const GUIDED       = 0x00000200;
        const MOVER_STOP   = 0x00000400;
    }
}
pub const EF_GUIDED: EntityFlags = EntityFlags::GUIDED;

// ============================================================
// Renderer interface types
// ============================================================

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct RenderFx: i32 {
        const MINLIGHT        = 0x0001;
        const THIRD_PERSON    = 0x0002;
        const FIRST_PERSON    = 0x0004;
        const DEPTHHACK       = 0x0008;
        const NOSHADOW        = 0x0040;
        /// Use `RefEntity::lighting_origin` instead of `origin` for lighting.
        const LIGHTING_ORIGIN = 0x0080;
        const SHADOW_PLANE    = 0x0100;
        const WRAP_FRAMES     = 0x0200;
    }
}
pub const RF_LIGHTING_ORIGIN: RenderFx = RenderFx::LIGHTING_ORIGIN;

/// refEntityType_t
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefType {
    #[default]
    Model,
    Poly,
    Sprite,
    Beam,
    RailCore,
    RailRings,
    Lightning,
    PortalSurface,
}

/// refEntity_t: one renderable submitted to the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefEntity {
    pub re_type: RefType,
    pub renderfx: RenderFx,

    pub hmodel: QHandle,

    // lighting
    pub lighting_origin: Vec3,

    // orientation
    pub axis: [Vec3; 3],
    pub non_normalized_axes: bool,

    // most recent data
    pub origin: Vec3,
    pub frame: i32,

    // previous data for frame interpolation
    pub oldorigin: Vec3,
    pub oldframe: i32,
    pub backlerp: f32,

    // texturing
    pub skin_num: i32,
    pub custom_skin: QHandle,
    pub custom_shader: QHandle,

    // misc
    pub shader_rgba: [u8; 4],
    pub shader_time: f32,

    // extra sprite information
    pub radius: f32,
    pub rotation: f32,
}

impl Default for RefEntity {
    fn default() -> Self {
        Self {
            re_type: RefType::Model,
            renderfx: RenderFx::empty(),
            hmodel: 0,
            lighting_origin: [0.0; 3],
            axis: [[0.0; 3]; 3],
            non_normalized_axes: false,
            origin: [0.0; 3],
            frame: 0,
            oldorigin: [0.0; 3],
            oldframe: 0,
            backlerp: 0.0,
            skin_num: 0,
            custom_skin: 0,
            custom_shader: 0,
            shader_rgba: [0; 4],
            shader_time: 0.0,
            radius: 0.0,
            rotation: 0.0,
        }
    }
}

/// polyVert_t
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PolyVert {
    pub xyz: Vec3,
    pub st: [f32; 2],
    pub modulate: [u8; 4],
}

// ============================================================
// Plane / trace
// ============================================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CPlane {
    pub normal: Vec3,
    pub dist: f32,
    pub plane_type: u8,
    pub signbits: u8,
}

#[derive(Debug, Clone)]
pub struct Trace {
    pub allsolid: bool,
    pub startsolid: bool,
    pub fraction: f32,
    pub endpos: Vec3,
    pub plane: CPlane,
    pub surface_flags: i32,
    pub contents: Contents,
    pub entity_num: i32,
}

impl Default for Trace {
    fn default() -> Self {
        Self {
            allsolid: false,
            startsolid: false,
            fraction: 1.0,
            endpos: [0.0; 3],
            plane: CPlane::default(),
            surface_flags: 0,
            contents: Contents::empty(),
            entity_num: -1,
        }
    }
}

// ============================================================
// Trajectories
// ============================================================

/// trType_t
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrType {
    #[default]
    Stationary,
    Interpolate, // non-parametric, but interpolate between snapshots
    Linear,
    LinearStop,
    Sine, // value = base + sin( time / duration ) * delta
    Gravity,
}

/// trajectory_t: compact motion descriptor evaluated by `bg_misc`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trajectory {
    pub tr_type: TrType,
    pub tr_time: i32,
    pub tr_duration: i32, // if non 0, tr_time + tr_duration = stop time
    pub tr_base: Vec3,
    pub tr_delta: Vec3, // velocity, etc
    pub gravity: f32,
}

impl Default for Trajectory {
    fn default() -> Self {
        Self {
            tr_type: TrType::Stationary,
            tr_time: 0,
            tr_duration: 0,
            tr_base: [0.0; 3],
            tr_delta: [0.0; 3],
            gravity: DEFAULT_GRAVITY,
        }
    }
}

// ============================================================
// MATHLIB: Vector operations
// ============================================================

#[inline]
pub fn dot_product(a: &Vec3, b: &Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn vector_subtract(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn vector_add(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn vector_negate(v: &Vec3) -> Vec3 {
    [-v[0], -v[1], -v[2]]
}

/// veca + scale * vecb
pub fn vector_ma(veca: &Vec3, scale: f32, vecb: &Vec3) -> Vec3 {
    [
        veca[0] + scale * vecb[0],
        veca[1] + scale * vecb[1],
        veca[2] + scale * vecb[2],
    ]
}

/// Normalize in place, returns original length.
pub fn vector_normalize(v: &mut Vec3) -> f32 {
    let length = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if length != 0.0 {
        let ilength = 1.0 / length;
        v[0] *= ilength;
        v[1] *= ilength;
        v[2] *= ilength;
    }
    length
}

pub fn vector_length(v: &Vec3) -> f32 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

pub fn distance(p1: &Vec3, p2: &Vec3) -> f32 {
    vector_length(&vector_subtract(p2, p1))
}

pub fn vector_scale(v: &Vec3, scale: f32) -> Vec3 {
    [v[0] * scale, v[1] * scale, v[2] * scale]
}

pub fn cross_product(v1: &Vec3, v2: &Vec3) -> Vec3 {
    [
        v1[1] * v2[2] - v1[2] * v2[1],
        v1[2] * v2[0] - v1[0] * v2[2],
        v1[0] * v2[1] - v1[1] * v2[0],
    ]
}

// ============================================================
// Angle functions
// ============================================================

pub fn angle_vectors(
    angles: &Vec3,
    forward: Option<&mut Vec3>,
    right: Option<&mut Vec3>,
    up: Option<&mut Vec3>,
) {
    let angle_yaw = angles[YAW].to_radians();
    let sy = angle_yaw.sin();
    let cy = angle_yaw.cos();

    let angle_pitch = angles[PITCH].to_radians();
    let sp = angle_pitch.sin();
    let cp = angle_pitch.cos();

    let angle_roll = angles[ROLL].to_radians();
    let sr = angle_roll.sin();
    let cr = angle_roll.cos();

    if let Some(fwd) = forward {
        fwd[0] = cp * cy;
        fwd[1] = cp * sy;
        fwd[2] = -sp;
    }
    if let Some(r) = right {
        r[0] = -sr * sp * cy + -cr * -sy;
        r[1] = -sr * sp * sy + -cr * cy;
        r[2] = -sr * cp;
    }
    if let Some(u) = up {
        u[0] = cr * sp * cy + -sr * -sy;
        u[1] = cr * sp * sy + -sr * cy;
        u[2] = cr * cp;
    }
}

/// Build a (forward, left, up) rotation axis from euler angles.
pub fn angles_to_axis(angles: &Vec3) -> [Vec3; 3] {
    let mut axis = [[0.0f32; 3]; 3];
    let [forward, right, up] = &mut axis;
    angle_vectors(angles, Some(forward), Some(right), Some(up));
    // angle_vectors returns "right" instead of "y axis"
    axis[1] = vector_negate(&axis[1]);
    axis
}

pub fn axis_clear() -> [Vec3; 3] {
    [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
}

// ============================================================
// Tests
// ============================================================
