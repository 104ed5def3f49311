//! Models used by the demo routes.
//!
//! Each builder returns a shared [`Model`] so the same definition can be
//! referenced from several contracts.

use std::sync::Arc;

use rust_decimal::Decimal;

use tessera_core::{BoundValue, ContractError, EnumSpec, Model, ParameterSpec, TargetType};

/// An image reference: `url` (http/https) and `name`.
pub fn image() -> Result<Arc<Model>, ContractError> {
    Model::builder("Image")
        .field(ParameterSpec::field("url", TargetType::Url).example("https://example.org/1.png".into()))
        .field(ParameterSpec::field("name", TargetType::String).example("A pretty image".into()))
        .build()
        .map(Arc::new)
}

/// A catalogue item.
///
/// `price` must be non-negative and `description` at most 100 characters.
/// `tags` defaults to an empty list; `id`, `tax` and `images` to null.
pub fn item(image: &Arc<Model>) -> Result<Arc<Model>, ContractError> {
    Model::builder("Item")
        .field(ParameterSpec::field("id", TargetType::Integer).optional())
        .field(ParameterSpec::field("name", TargetType::String))
        .field(
            ParameterSpec::field("description", TargetType::String)
                .optional()
                .max_length(100),
        )
        .field(ParameterSpec::field("price", TargetType::Decimal).ge(Decimal::ZERO))
        .field(ParameterSpec::field("tax", TargetType::Decimal).optional())
        .field(
            ParameterSpec::field("tags", TargetType::sequence(TargetType::String))
                .default(BoundValue::Seq(Vec::new())),
        )
        .field(
            ParameterSpec::field(
                "images",
                TargetType::sequence(TargetType::model(Arc::clone(image))),
            )
            .optional(),
        )
        .build()
        .map(Arc::new)
}

/// The acting user of an update.
pub fn user() -> Result<Arc<Model>, ContractError> {
    Model::builder("User")
        .field(ParameterSpec::field("username", TargetType::String).example("joebloggs".into()))
        .field(
            ParameterSpec::field("full_name", TargetType::String)
                .optional()
                .example("Joe Bloggs".into()),
        )
        .build()
        .map(Arc::new)
}

/// Sign-up payload, including the password.
pub fn user_in() -> Result<Arc<Model>, ContractError> {
    Model::builder("UserIn")
        .field(ParameterSpec::field("username", TargetType::String))
        .field(ParameterSpec::field("password", TargetType::String))
        .field(ParameterSpec::field("email", TargetType::Email))
        .field(ParameterSpec::field("full_name", TargetType::String).optional())
        .build()
        .map(Arc::new)
}

/// Public view of a user; never carries the password.
pub fn user_out() -> Result<Arc<Model>, ContractError> {
    Model::builder("UserOut")
        .field(ParameterSpec::field("username", TargetType::String))
        .field(ParameterSpec::field("email", TargetType::Email))
        .field(ParameterSpec::field("full_name", TargetType::String).optional())
        .build()
        .map(Arc::new)
}

/// The known network architectures.
#[must_use]
pub fn model_name() -> EnumSpec {
    EnumSpec::new("ModelName", ["alexnet", "resnet", "lenet"])
}
