//! Category request payloads.

use super::messages::{
    CATEGORY_ID_CANNOT_BE_EMPTY, CATEGORY_NAME_CANNOT_BE_EMPTY, CATEGORY_STATUS_CANNOT_BE_EMPTY,
    OWNER_ID_CANNOT_BE_EMPTY,
};
use super::{FieldErrors, RequestValidationError, Validate};
use crate::model::category::{Category, CategoryId};
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// Identifier and name fields shared by category requests that target an
/// existing category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequestBase {
    #[serde(default)]
    pub category_id: CategoryId,
    #[serde(default)]
    pub category_name: String,
}

impl CategoryRequestBase {
    fn check(&self, errors: &mut FieldErrors) {
        errors.require(
            !self.category_id.is_nil(),
            "categoryId",
            CATEGORY_ID_CANNOT_BE_EMPTY,
        );
        errors.require(
            !self.category_name.trim().is_empty(),
            "categoryName",
            CATEGORY_NAME_CANNOT_BE_EMPTY,
        );
    }
}

/// `PUT /categories` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    #[serde(flatten)]
    pub base: CategoryRequestBase,
    #[serde(default)]
    pub category_description: Option<String>,
    /// Required. `None` means the client omitted it.
    #[serde(default)]
    pub category_status: Option<bool>,
}

impl UpdateCategoryRequest {
    /// Copies the requested fields onto a loaded category.
    ///
    /// Call after `validate`; an absent status leaves the current one.
    pub fn apply_to(&self, category: &mut Category) {
        category.name = self.base.category_name.trim().to_string();
        category.description = self.category_description.clone();
        if let Some(status) = self.category_status {
            category.status = status;
        }
    }
}

impl Validate for UpdateCategoryRequest {
    fn validate(&self) -> Result<(), RequestValidationError> {
        let mut errors = FieldErrors::default();
        self.base.check(&mut errors);
        errors.require(
            self.category_status.is_some(),
            "categoryStatus",
            CATEGORY_STATUS_CANNOT_BE_EMPTY,
        );
        errors.finish()
    }
}

/// `POST /categories` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[serde(default)]
    pub owner_id: UserId,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub category_description: Option<String>,
}

impl CreateCategoryRequest {
    /// Builds a new enabled category from this request.
    pub fn to_category(&self) -> Category {
        let mut category = Category::new(self.owner_id, self.category_name.trim());
        category.description = self.category_description.clone();
        category
    }
}

impl Validate for CreateCategoryRequest {
    fn validate(&self) -> Result<(), RequestValidationError> {
        let mut errors = FieldErrors::default();
        errors.require(!self.owner_id.is_nil(), "ownerId", OWNER_ID_CANNOT_BE_EMPTY);
        errors.require(
            !self.category_name.trim().is_empty(),
            "categoryName",
            CATEGORY_NAME_CANNOT_BE_EMPTY,
        );
        errors.finish()
    }
}
