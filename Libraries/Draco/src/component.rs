//! Typed access to the raw component bytes of an attribute.
//!
//! Every storable numeric type implements [`Component`]. Per-type work is done
//! by generic functions over `T: Component`, selected at runtime from a
//! [`DataType`] tag through [`dispatch_data_type!`].

use crate::types::DataType;

/// A single component value widened for conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Integer(i128),
    Float(f64),
}

pub trait Component: Copy + Default + PartialEq + std::fmt::Debug + 'static {
    const DATA_TYPE: DataType;

    /// Reads one value from native-endian bytes. `bytes` holds exactly one component.
    fn read_ne(bytes: &[u8]) -> Self;

    fn write_ne(self, out: &mut [u8]);

    fn to_scalar(self) -> Scalar;

    /// `as`-cast from an integer already known to be in range.
    fn from_integer(value: i128) -> Self;

    /// `as`-cast from a float already known to be in range.
    fn from_float(value: f64) -> Self;

    /// Inclusive representable range for integral types, `None` for floats.
    fn integer_range() -> Option<(i128, i128)>;

    /// `num / den` evaluated in this type. Only used for floating point outputs.
    fn from_ratio(num: i128, den: i128) -> Self;

    fn size() -> usize {
        Self::DATA_TYPE.size()
    }
}

macro_rules! impl_integer_component {
    ($($t:ty => $dt:expr),* $(,)?) => {
        $(
            impl Component for $t {
                const DATA_TYPE: DataType = $dt;

                fn read_ne(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(bytes);
                    <$t>::from_ne_bytes(raw)
                }

                fn write_ne(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_ne_bytes());
                }

                fn to_scalar(self) -> Scalar {
                    Scalar::Integer(self as i128)
                }

                fn from_integer(value: i128) -> Self {
                    value as $t
                }

                fn from_float(value: f64) -> Self {
                    value as $t
                }

                fn integer_range() -> Option<(i128, i128)> {
                    Some((<$t>::MIN as i128, <$t>::MAX as i128))
                }

                fn from_ratio(num: i128, den: i128) -> Self {
                    (num / den) as $t
                }
            }
        )*
    };
}

impl_integer_component! {
    i8 => DataType::Int8,
    u8 => DataType::Uint8,
    i16 => DataType::Int16,
    u16 => DataType::Uint16,
    i32 => DataType::Int32,
    u32 => DataType::Uint32,
    i64 => DataType::Int64,
    u64 => DataType::Uint64,
}

macro_rules! impl_float_component {
    ($($t:ty => $dt:expr),* $(,)?) => {
        $(
            impl Component for $t {
                const DATA_TYPE: DataType = $dt;

                fn read_ne(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(bytes);
                    <$t>::from_ne_bytes(raw)
                }

                fn write_ne(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_ne_bytes());
                }

                fn to_scalar(self) -> Scalar {
                    Scalar::Float(self as f64)
                }

                fn from_integer(value: i128) -> Self {
                    value as $t
                }

                fn from_float(value: f64) -> Self {
                    value as $t
                }

                fn integer_range() -> Option<(i128, i128)> {
                    None
                }

                fn from_ratio(num: i128, den: i128) -> Self {
                    num as $t / den as $t
                }
            }
        )*
    };
}

impl_float_component! {
    f32 => DataType::Float32,
    f64 => DataType::Float64,
}

impl Component for bool {
    const DATA_TYPE: DataType = DataType::Bool;

    fn read_ne(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }

    fn write_ne(self, out: &mut [u8]) {
        out[0] = u8::from(self);
    }

    fn to_scalar(self) -> Scalar {
        Scalar::Integer(i128::from(self))
    }

    fn from_integer(value: i128) -> Self {
        value != 0
    }

    fn from_float(value: f64) -> Self {
        value != 0.0
    }

    fn integer_range() -> Option<(i128, i128)> {
        Some((0, 1))
    }

    fn from_ratio(num: i128, den: i128) -> Self {
        num / den != 0
    }
}

/// Runs `$body` with `$t` bound to the Rust type matching a [`DataType`] tag.
/// `Invalid` evaluates `$fallback` instead.
#[macro_export]
macro_rules! dispatch_data_type {
    ($data_type:expr, $t:ident => $body:expr, _ => $fallback:expr) => {
        match $data_type {
            $crate::types::DataType::Int8 => { type $t = i8; $body }
            $crate::types::DataType::Uint8 => { type $t = u8; $body }
            $crate::types::DataType::Int16 => { type $t = i16; $body }
            $crate::types::DataType::Uint16 => { type $t = u16; $body }
            $crate::types::DataType::Int32 => { type $t = i32; $body }
            $crate::types::DataType::Uint32 => { type $t = u32; $body }
            $crate::types::DataType::Int64 => { type $t = i64; $body }
            $crate::types::DataType::Uint64 => { type $t = u64; $body }
            $crate::types::DataType::Float32 => { type $t = f32; $body }
            $crate::types::DataType::Float64 => { type $t = f64; $body }
            $crate::types::DataType::Bool => { type $t = bool; $body }
            $crate::types::DataType::Invalid => $fallback,
        }
    };
}

/// Converts one component from `T` to `O`.
///
/// Returns `None` when the value cannot be represented in `O`: out of range
/// integers, non-finite floats going to an integer type, or normalized floats
/// outside `[0, 1]`.
pub fn convert_component<T: Component, O: Component>(value: T, normalized: bool) -> Option<O> {
    match (value.to_scalar(), O::integer_range()) {
        (Scalar::Integer(v), Some((min, max))) => {
            if T::DATA_TYPE != DataType::Bool && (v < min || v > max) {
                return None;
            }
            Some(O::from_integer(v))
        }
        (Scalar::Float(v), Some((min, max))) => {
            if !v.is_finite() {
                return None;
            }
            if v < min as f64 || v >= max as f64 {
                return None;
            }
            if normalized {
                if !(0.0..=1.0).contains(&v) || O::size() > 4 {
                    return None;
                }
                return Some(O::from_float((v * max as f64 + 0.5).floor()));
            }
            Some(O::from_float(v))
        }
        (Scalar::Integer(v), None) => {
            if normalized {
                let (_, source_max) = T::integer_range()?;
                return Some(O::from_ratio(v, source_max));
            }
            Some(O::from_integer(v))
        }
        (Scalar::Float(v), None) => Some(O::from_float(v)),
    }
}

/// Decodes the components in `bytes` (native-endian `T`) into `out` as `O`.
///
/// Writes `min(out.len(), components in bytes)` values and zero-fills the rest.
pub fn convert_components<T: Component, O: Component>(
    bytes: &[u8],
    normalized: bool,
    out: &mut [O],
) -> bool {
    let size = T::size();
    let available = bytes.len() / size;
    for (i, slot) in out.iter_mut().enumerate() {
        if i >= available {
            *slot = O::default();
            continue;
        }
        let value = T::read_ne(&bytes[i * size..(i + 1) * size]);
        match convert_component::<T, O>(value, normalized) {
            Some(converted) => *slot = converted,
            None => return false,
        }
    }
    true
}

/// Native-endian byte image of a typed slice.
pub fn to_ne_bytes<T: Component>(values: &[T]) -> Vec<u8> {
    let size = T::size();
    let mut bytes = vec![0u8; values.len() * size];
    for (value, chunk) in values.iter().zip(bytes.chunks_exact_mut(size)) {
        value.write_ne(chunk);
    }
    bytes
}

/// Typed view of a native-endian byte image. Trailing partial components are ignored.
pub fn from_ne_bytes<T: Component>(bytes: &[u8]) -> Vec<T> {
    bytes.chunks_exact(T::size()).map(T::read_ne).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn float_to_int_truncates() {
        assert_eq!(convert_component::<f64, i32>(2.9, false), Some(2));
        assert_eq!(convert_component::<f64, i32>(-2.9, false), Some(-2));
        assert_eq!(convert_component::<f32, u8>(255.5, false), None);
    }

    #[test]
    fn non_finite_floats_do_not_become_integers() {
        assert_eq!(convert_component::<f32, i32>(f32::NAN, false), None);
        assert_eq!(convert_component::<f64, i16>(f64::INFINITY, false), None);
        assert!(convert_component::<f64, f32>(f64::NAN, false).is_some_and(f32::is_nan));
    }

    #[test]
    fn integer_range_is_checked() {
        assert_eq!(convert_component::<i32, u8>(256, false), None);
        assert_eq!(convert_component::<i32, u8>(-1, false), None);
        assert_eq!(convert_component::<u32, i16>(32_767, false), Some(32_767));
        assert_eq!(convert_component::<u64, i8>(u64::MAX, false), None);
        assert_eq!(convert_component::<bool, i8>(true, false), Some(1));
    }

    #[test]
    fn normalized_conversions() {
        assert_eq!(convert_component::<u8, f32>(255, true), Some(1.0));
        assert_eq!(convert_component::<u8, f32>(0, true), Some(0.0));
        assert_eq!(convert_component::<f32, u8>(1.0, true), Some(255));
        assert_eq!(convert_component::<f32, u64>(0.5, true), None);
        assert_eq!(convert_component::<f32, u16>(0.5, true), Some(32_768));
        assert_eq!(convert_component::<f32, u16>(1.5, true), None);
        assert_eq!(convert_component::<f64, i32>(-0.25, true), None);
    }

    #[test]
    fn missing_components_are_zero_filled() {
        let bytes = to_ne_bytes(&[1.5f32, 2.5]);
        let mut out = [9i32; 3];
        assert!(convert_components::<f32, i32>(&bytes, false, &mut out));
        assert_eq!(out, [1, 2, 0]);
    }

    #[test]
    fn dispatch_selects_matching_type() {
        fn width<T: Component>() -> usize {
            T::size()
        }
        for raw in 1..=11 {
            let data_type = DataType::from_raw(raw);
            let size = dispatch_data_type!(data_type, T => width::<T>(), _ => 0);
            assert_eq!(size, data_type.size());
        }
        assert_eq!(dispatch_data_type!(DataType::Invalid, T => width::<T>(), _ => 0), 0);
    }

    proptest! {
        #[test]
        fn byte_image_round_trips(values in proptest::collection::vec(any::<i16>(), 0..64)) {
            prop_assert_eq!(from_ne_bytes::<i16>(&to_ne_bytes(&values)), values);
        }

        #[test]
        fn widening_integer_conversion_is_exact(v in any::<i16>()) {
            prop_assert_eq!(convert_component::<i16, i32>(v, false), Some(i32::from(v)));
            prop_assert_eq!(convert_component::<i16, f64>(v, false), Some(f64::from(v)));
        }
    }
}
