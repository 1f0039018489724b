//! Color representations.

/// A CIE XYZ color.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cxyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A CIE L\*a\*b\* color.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CLab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

/// The D50 white point.
pub const D50: Cxyz = Cxyz {
    x: 0.9642,
    y: 1.,
    z: 0.8249,
};

fn xyz2lab_f(t: f64) -> f64 {
    let limit = (24. / 116.) * (24. / 116.) * (24. / 116.);

    if t <= limit {
        (841. / 108.) * t + (16. / 116.)
    } else {
        t.cbrt()
    }
}

fn xyz2lab_f_inv(t: f64) -> f64 {
    let limit = 24. / 116.;

    if t <= limit {
        (108. / 841.) * (t - (16. / 116.))
    } else {
        t * t * t
    }
}

impl Cxyz {
    /// Largest XYZ component representable in the 16-bit PCS encoding.
    pub const MAX_ENCODABLE: f64 = 1.0 + 32767.0 / 32768.0;

    /// Converts this color to L\*a\*b\* with the given white point.
    ///
    /// Can handle negative values “in some cases.”
    pub fn into_lab(self, white_point: Cxyz) -> CLab {
        let fx = xyz2lab_f(self.x / white_point.x);
        let fy = xyz2lab_f(self.y / white_point.y);
        let fz = xyz2lab_f(self.z / white_point.z);

        CLab {
            l: 116. * fy - 16.,
            a: 500. * (fx - fy),
            b: 200. * (fy - fz),
        }
    }
}

impl CLab {
    /// Converts this color to XYZ with the given white point.
    /// May return negative values.
    pub fn into_xyz(self, white_point: Cxyz) -> Cxyz {
        let y = (self.l + 16.) / 116.;
        let x = y + 0.002 * self.a;
        let z = y - 0.005 * self.b;

        Cxyz {
            x: xyz2lab_f_inv(x) * white_point.x,
            y: xyz2lab_f_inv(y) * white_point.y,
            z: xyz2lab_f_inv(z) * white_point.z,
        }
    }
}

#[test]
fn lab_xyz_round_trip() {
    let lab = D50.into_lab(D50);
    assert!((lab.l - 100.).abs() < 1e-9);
    assert!(lab.a.abs() < 1e-9 && lab.b.abs() < 1e-9);

    let color = Cxyz {
        x: 0.2,
        y: 0.3,
        z: 0.004,
    };
    let back = color.into_lab(D50).into_xyz(D50);
    assert!((color.x - back.x).abs() < 1e-9);
    assert!((color.y - back.y).abs() < 1e-9);
    assert!((color.z - back.z).abs() < 1e-9);
}
