//! Registry of inference applications the adapter can delegate to.

use super::{AdapterError, InferenceApp};
use crate::config::ConfigurationError;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use tracing::info;

type AppFactory = Box<dyn Fn() -> anyhow::Result<Box<dyn InferenceApp>> + Send + Sync>;

/// A reference to an inference application in the form `module.path.ClassName`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppReference {
	module: String,
	name: String,
}

impl AppReference {
	/// Splits a reference at its last `.` into module and application name.
	///
	/// # Errors
	/// Returns [`ConfigurationError::MissingAppReference`] for an empty reference and
	/// [`ConfigurationError::InvalidAppReference`] if either part is missing.
	pub fn parse(reference: &str) -> Result<Self, ConfigurationError> {
		let reference = reference.trim();
		if reference.is_empty() {
			return Err(ConfigurationError::MissingAppReference);
		}

		match reference.rsplit_once('.') {
			Some((module, name)) if !module.is_empty() && !name.is_empty() => Ok(Self {
				module: module.to_owned(),
				name: name.to_owned(),
			}),
			_ => Err(ConfigurationError::InvalidAppReference {
				reference: reference.to_owned(),
			}),
		}
	}

	pub fn module(&self) -> &str {
		&self.module
	}

	pub fn name(&self) -> &str {
		&self.name
	}
}

impl Display for AppReference {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}.{}", self.module, self.name)
	}
}

/// Holds the inference applications provided by the embedding application.
///
/// Applications are registered under their reference and instantiated on demand.
#[derive(Default)]
pub struct AppRegistry {
	factories: HashMap<AppReference, AppFactory>,
}

impl AppRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a factory for the application with the given reference.
	/// A factory registered under the same reference is replaced.
	///
	/// # Errors
	/// Fails if the reference is not of the form `module.ClassName`.
	pub fn register<F>(&mut self, reference: &str, factory: F) -> Result<(), ConfigurationError>
	where
		F: Fn() -> anyhow::Result<Box<dyn InferenceApp>> + Send + Sync + 'static,
	{
		let reference = AppReference::parse(reference)?;
		info!(
			app.module = %reference.module,
			app.name = %reference.name,
			"Registered inference application"
		);
		self.factories.insert(reference, Box::new(factory));
		Ok(())
	}

	pub fn contains(&self, reference: &AppReference) -> bool {
		self.factories.contains_key(reference)
	}

	/// Resolves a reference, failing if nothing was registered for it.
	///
	/// # Errors
	/// Returns [`ConfigurationError::UnresolvedApp`] for unknown references.
	pub fn resolve(&self, reference: &str) -> Result<AppReference, ConfigurationError> {
		let reference = AppReference::parse(reference)?;
		if self.contains(&reference) {
			Ok(reference)
		} else {
			Err(ConfigurationError::UnresolvedApp {
				reference: reference.to_string(),
			})
		}
	}

	/// Creates a new instance of the referenced application.
	///
	/// # Errors
	/// Fails if the reference is unknown or the factory itself fails.
	pub fn instantiate(
		&self,
		reference: &AppReference,
	) -> Result<Box<dyn InferenceApp>, AdapterError> {
		let factory = self
			.factories
			.get(reference)
			.ok_or_else(|| ConfigurationError::UnresolvedApp {
				reference: reference.to_string(),
			})?;

		factory().map_err(|error| {
			AdapterError::App(error.context(format!(
				"Failed to create inference application `{reference}`"
			)))
		})
	}

	/// List all registered references.
	pub fn references(&self) -> impl Iterator<Item = &AppReference> {
		self.factories.keys()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::adapter::{ResultUploader, RunRequest};

	struct NoopApp;

	impl InferenceApp for NoopApp {
		fn run(
			&mut self,
			_request: &RunRequest<'_>,
			_uploader: &mut dyn ResultUploader,
		) -> anyhow::Result<()> {
			Ok(())
		}
	}

	#[test]
	fn parse_splits_at_last_dot() {
		let reference = AppReference::parse("my_app.inference.SpleenApp").unwrap();
		assert_eq!(reference.module(), "my_app.inference");
		assert_eq!(reference.name(), "SpleenApp");
		assert_eq!(reference.to_string(), "my_app.inference.SpleenApp");
	}

	#[test]
	fn parse_rejects_empty_and_malformed_references() {
		assert!(matches!(
			AppReference::parse("  "),
			Err(ConfigurationError::MissingAppReference)
		));
		for reference in ["SpleenApp", ".SpleenApp", "my_app."] {
			assert!(matches!(
				AppReference::parse(reference),
				Err(ConfigurationError::InvalidAppReference { .. })
			));
		}
	}

	#[test]
	fn resolve_requires_registration() {
		let mut registry = AppRegistry::new();
		registry
			.register("apps.NoopApp", || Ok(Box::new(NoopApp)))
			.unwrap();

		assert_eq!(registry.resolve("apps.NoopApp").unwrap().name(), "NoopApp");
		assert!(matches!(
			registry.resolve("apps.OtherApp"),
			Err(ConfigurationError::UnresolvedApp { .. })
		));
		assert_eq!(registry.references().count(), 1);
	}

	#[test]
	fn factory_errors_are_reported() {
		let mut registry = AppRegistry::new();
		registry
			.register("apps.BrokenApp", || anyhow::bail!("no GPU available"))
			.unwrap();

		let reference = registry.resolve("apps.BrokenApp").unwrap();
		let Err(AdapterError::App(error)) = registry.instantiate(&reference) else {
			panic!("expected the factory error");
		};
		assert!(format!("{error:#}").contains("no GPU available"));
	}
}
