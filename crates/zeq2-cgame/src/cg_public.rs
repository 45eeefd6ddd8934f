//! Engine import interface. Everything the cgame effect code needs from
//! the engine goes through `CgameImport`.
//!
//! Scene calls are fire-and-forget. The hook methods have empty default
//! bodies; an engine overrides them to leave decals or play sounds.

use zeq2_common::q_shared::{Contents, EntityFlags, PolyVert, QHandle, RefEntity, Trace, Vec3};

use crate::cg_local::LeBounceSound;

pub trait CgameImport {
    // ---- collision ----

    /// Swept point trace against world geometry.
    fn trace(&self, start: &Vec3, end: &Vec3, content_mask: Contents) -> Trace;
    fn point_contents(&self, point: &Vec3) -> Contents;
    /// (mins, maxs) of a model frame.
    fn model_bounds(&self, model: QHandle, frame: i32) -> (Vec3, Vec3);

    // ---- snapshot ----

    /// Replicated flags of the entity in slot `ent_num`.
    fn entity_flags(&self, ent_num: usize) -> EntityFlags;

    // ---- scene ----

    fn add_ref_entity_to_scene(&mut self, re: &RefEntity);
    fn add_light_to_scene(&mut self, origin: &Vec3, intensity: f32, color: &Vec3);
    fn add_poly_to_scene(&mut self, shader: QHandle, verts: &[PolyVert]);
    fn add_line_to_scene(&mut self, start: &Vec3, end: &Vec3, width: f32, shader: QHandle, rgba: [u8; 4]);
    fn add_debug_box(&mut self, _origin: &Vec3, _mins: &Vec3, _maxs: &Vec3) {}

    // ---- hooks ----

    /// A fragment hit a surface and may leave a decal.
    fn fragment_bounce_mark(&mut self, _sound: LeBounceSound, _trace: &Trace) {}
    fn fragment_bounce_sound(&mut self, _sound: LeBounceSound, _trace: &Trace) {}
    /// A blood-emitting fragment moved freely this frame.
    fn blood_trail(&mut self, _origin: &Vec3) {}
}
