use std::fmt;

/// Numeric type of the blender's weight accumulators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WeightType {
	/// Mask bytes are scaled to `[0, 1]`; normalization adds a small epsilon.
	#[default]
	Float32,
	/// Mask bytes are kept as integers (nonzero bytes offset by one so the
	/// denominator can never vanish); products rescale by shifting.
	Int16,
}

impl TryFrom<&str> for WeightType {
	type Error = anyhow::Error;

	fn try_from(value: &str) -> Result<Self, Self::Error> {
		match value.to_lowercase().as_str() {
			"float32" | "f32" => Ok(WeightType::Float32),
			"int16" | "i16" => Ok(WeightType::Int16),
			_ => anyhow::bail!("Invalid weight type '{value}'. Expected 'float32' or 'int16'."),
		}
	}
}

impl fmt::Display for WeightType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			WeightType::Float32 => write!(f, "float32"),
			WeightType::Int16 => write!(f, "int16"),
		}
	}
}
