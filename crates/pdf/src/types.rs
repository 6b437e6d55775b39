use serde::Serialize;

/// A page's MediaBox: `[llx lly urx ury]` in default user space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MediaBox {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl MediaBox {
    /// US Letter, used when a synthetic page needs a box.
    pub const LETTER: MediaBox = MediaBox {
        llx: 0.0,
        lly: 0.0,
        urx: 612.0,
        ury: 792.0,
    };

    /// Build from a slice of at least four numbers.
    pub fn from_slice(nums: &[f32]) -> Option<Self> {
        match nums {
            [llx, lly, urx, ury, ..] => Some(MediaBox {
                llx: *llx,
                lly: *lly,
                urx: *urx,
                ury: *ury,
            }),
            _ => None,
        }
    }

    pub fn width(&self) -> f32 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f32 {
        self.ury - self.lly
    }

    /// The box as a PDF array object.
    pub fn to_object(&self) -> lopdf::Object {
        lopdf::Object::Array(vec![
            self.llx.into(),
            self.lly.into(),
            self.urx.into(),
            self.ury.into(),
        ])
    }
}
