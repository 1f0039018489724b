use cgmath::prelude::*;
use cgmath::{Matrix3, Vector3};

/// Creates a repr(primitive) enum with conversion to/from the primitive type.
macro_rules! enum_primitive {
    (
        $(#[$meta:meta])* pub $name:ident ($ty:tt)
        { $($(#[$vmeta:meta])* $variant:ident = $value:expr,)+ }
    ) => {
        $(#[$meta])*
        #[repr($ty)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value,)+
        }

        impl std::convert::TryFrom<$ty> for $name {
            type Error = $ty;
            fn try_from(value: $ty) -> Result<$name, $ty> {
                match value {
                    $(
                        $value => Ok($name::$variant),
                    )+
                    _ => Err(value),
                }
            }
        }

        impl From<$name> for $ty {
            fn from(this: $name) -> $ty {
                this as $ty
            }
        }
    };
}

/// Reads a row-major 3×3 matrix.
pub(crate) fn mat3_from_rows(m: &[f64]) -> Matrix3<f64> {
    // cgmath takes columns
    Matrix3::new(m[0], m[3], m[6], m[1], m[4], m[7], m[2], m[5], m[8])
}

/// Writes a 3×3 matrix in row-major order.
pub(crate) fn mat3_to_rows(m: Matrix3<f64>) -> Vec<f64> {
    vec![
        m.x.x, m.y.x, m.z.x, //
        m.x.y, m.y.y, m.z.y, //
        m.x.z, m.y.z, m.z.z,
    ]
}

/// Returns true if the matrix is the identity within a tolerance.
pub(crate) fn mat3_is_identity(m: Matrix3<f64>, epsilon: f64) -> bool {
    let identity = Matrix3::<f64>::identity();
    for col in 0..3 {
        for row in 0..3 {
            if (m[col][row] - identity[col][row]).abs() > epsilon {
                return false;
            }
        }
    }
    true
}

/// Solves `m * x = b`. Returns None if the matrix is singular.
pub(crate) fn solve_mat3(m: Matrix3<f64>, b: Vector3<f64>) -> Option<Vector3<f64>> {
    m.invert().map(|inverse| inverse * b)
}

#[test]
fn row_major_round_trip() {
    let rows = [1., 2., 3., 4., 5., 6., 7., 8., 10.];
    let m = mat3_from_rows(&rows);
    assert_eq!(mat3_to_rows(m), rows.to_vec());

    // first row times (1, 0, 0) is the first column
    let v = m * Vector3::new(1., 0., 0.);
    assert_eq!((v.x, v.y, v.z), (1., 4., 7.));

    let x = solve_mat3(m, Vector3::new(6., 15., 25.)).unwrap();
    assert!((x.x - 1.).abs() < 1e-9 && (x.y - 1.).abs() < 1e-9 && (x.z - 1.).abs() < 1e-9);

    assert!(mat3_is_identity(Matrix3::identity(), 1e-5));
    assert!(!mat3_is_identity(m, 1e-5));
}
