//! Cell value types

use num_traits::{NumCast, Zero};
use std::fmt::{Debug, Display};

/// Types that can be stored in a raster cell.
///
/// Floating point cells treat NaN as no-data regardless of the declared
/// no-data value, which is how unset gridding cells are represented.
pub trait RasterElement:
    Copy + Debug + Display + PartialOrd + NumCast + Zero + Send + Sync + 'static
{
    /// Default no-data value for this type
    fn default_nodata() -> Self;

    /// Check if this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Convert self to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

macro_rules! impl_int_element {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::MIN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata == Some(*self)
            }
        }
    )*};
}

macro_rules! impl_float_element {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                if self.is_nan() {
                    return true;
                }
                match nodata {
                    Some(nd) if !nd.is_nan() => (self - nd).abs() < <$t>::EPSILON * 100.0,
                    _ => false,
                }
            }
        }
    )*};
}

impl_int_element!(i16, i32, u8, u16, u32);
impl_float_element!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_is_always_nodata() {
        assert!(f64::NAN.is_nodata(None));
        assert!(f64::NAN.is_nodata(Some(-9999.0)));
        assert!(!1.5_f64.is_nodata(Some(f64::NAN)));
    }

    #[test]
    fn declared_nodata_matches() {
        assert!((-9999.0_f32).is_nodata(Some(-9999.0)));
        assert!(0_i32.is_nodata(Some(0)));
        assert!(!1_i32.is_nodata(Some(0)));
        assert!(!1_u8.is_nodata(None));
    }
}
