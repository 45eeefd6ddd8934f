// Recording stand-in for the engine, shared by the unit tests.

use zeq2_common::q_shared::*;

use crate::cg_local::LeBounceSound;
use crate::cg_public::CgameImport;

#[derive(Default)]
pub struct MockImport {
    pub entities: Vec<RefEntity>,
    pub lights: Vec<(Vec3, f32, Vec3)>,
    pub polys: Vec<(QHandle, Vec<PolyVert>)>,
    pub lines: Vec<(Vec3, Vec3, f32, QHandle, [u8; 4])>,
    pub boxes: Vec<(Vec3, Vec3, Vec3)>,
    pub marks: Vec<LeBounceSound>,
    pub sounds: Vec<LeBounceSound>,
    pub blood_trails: usize,
    /// Entity slots flagged as guided
    pub guided: Vec<usize>,
    /// Horizontal floor plane that traces stop on
    pub floor_z: Option<f32>,
    pub floor_allsolid: bool,
    pub nodrop: bool,
    pub bounds: (Vec3, Vec3),
}

impl MockImport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_floor(z: f32) -> Self {
        Self {
            floor_z: Some(z),
            ..Self::default()
        }
    }
}

impl CgameImport for MockImport {
    fn trace(&self, start: &Vec3, end: &Vec3, _content_mask: Contents) -> Trace {
        if let Some(fz) = self.floor_z {
            if start[2] >= fz && end[2] < fz {
                let fraction = (start[2] - fz) / (start[2] - end[2]);
                let endpos = [
                    start[0] + (end[0] - start[0]) * fraction,
                    start[1] + (end[1] - start[1]) * fraction,
                    fz,
                ];
                return Trace {
                    allsolid: self.floor_allsolid,
                    fraction,
                    endpos,
                    plane: CPlane {
                        normal: [0.0, 0.0, 1.0],
                        dist: fz,
                        ..Default::default()
                    },
                    contents: Contents::SOLID,
                    ..Default::default()
                };
            }
        }
        Trace {
            fraction: 1.0,
            endpos: *end,
            ..Default::default()
        }
    }

    fn point_contents(&self, _point: &Vec3) -> Contents {
        if self.nodrop {
            Contents::NODROP
        } else {
            Contents::empty()
        }
    }

    fn model_bounds(&self, _model: QHandle, _frame: i32) -> (Vec3, Vec3) {
        self.bounds
    }

    fn entity_flags(&self, ent_num: usize) -> EntityFlags {
        if self.guided.contains(&ent_num) {
            EntityFlags::GUIDED
        } else {
            EntityFlags::empty()
        }
    }

    fn add_ref_entity_to_scene(&mut self, re: &RefEntity) {
        self.entities.push(*re);
    }

    fn add_light_to_scene(&mut self, origin: &Vec3, intensity: f32, color: &Vec3) {
        self.lights.push((*origin, intensity, *color));
    }

    fn add_poly_to_scene(&mut self, shader: QHandle, verts: &[PolyVert]) {
        self.polys.push((shader, verts.to_vec()));
    }

    fn add_line_to_scene(&mut self, start: &Vec3, end: &Vec3, width: f32, shader: QHandle, rgba: [u8; 4]) {
        self.lines.push((*start, *end, width, shader, rgba));
    }

    fn add_debug_box(&mut self, origin: &Vec3, mins: &Vec3, maxs: &Vec3) {
        self.boxes.push((*origin, *mins, *maxs));
    }

    fn fragment_bounce_mark(&mut self, sound: LeBounceSound, _trace: &Trace) {
        self.marks.push(sound);
    }

    fn fragment_bounce_sound(&mut self, sound: LeBounceSound, _trace: &Trace) {
        self.sounds.push(sound);
    }

    fn blood_trail(&mut self, _origin: &Vec3) {
        self.blood_trails += 1;
    }
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}
