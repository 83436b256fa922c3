use schemars::JsonSchema;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// Path parameters of routes addressing a single record.
#[derive(Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	/// The unique identifier of the record.
	pub id: Uuid,
}

/// Records a `required` error for `field` unless `value` is a non-empty string.
///
/// Inputs validated this way implement [`Validate`] by hand: derived validators would
/// also constrain the JSON schema, and the schema check would then reject the body
/// before a field-specific message could be produced.
pub fn require_text(
	errors: &mut ValidationErrors,
	field: &'static str,
	value: Option<&str>,
	message: &'static str,
) {
	if value.map_or(true, str::is_empty) {
		let mut error = ValidationError::new("required");
		error.message = Some(message.into());

		errors.add(field, error);
	}
}

/// Converts collected errors into the result expected from [`Validate::validate`].
pub fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
	if errors.is_empty() {
		Ok(())
	} else {
		Err(errors)
	}
}

#[cfg(test)]
mod test {
	use super::IdInput;

	#[test]
	fn test_id_input_rejects_malformed_ids() {
		let result = serde_json::from_value::<IdInput>(serde_json::json!({ "id": "not-an-id" }));

		assert!(result.is_err());
	}
}
