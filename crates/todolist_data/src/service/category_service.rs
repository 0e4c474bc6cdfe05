//! Category use-case service.

use super::{not_found, run_in_transaction, ServiceResult};
use crate::api_model::category::{CreateCategoryRequest, UpdateCategoryRequest};
use crate::api_model::Validate;
use crate::model::category::{Category, CategoryId};
use crate::model::user::{User, UserId};
use crate::repo::entity::Entity;
use crate::uow::{UnitOfWork, UnitOfWorkFactory};
use log::info;

pub struct CategoryService<F: UnitOfWorkFactory> {
    factory: F,
}

impl<F: UnitOfWorkFactory> CategoryService<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    /// Creates a category for an existing owner.
    pub fn create_category(&self, request: &CreateCategoryRequest) -> ServiceResult<Category> {
        request.validate()?;
        let uow = self.factory.create()?;

        let category = run_in_transaction(&uow, |uow| {
            if uow.users().find(request.owner_id)?.is_none() {
                return not_found(User::KIND, request.owner_id);
            }
            let category = request.to_category();
            uow.categories().add(&category)?;
            Ok(category)
        })?;

        info!(
            "event=category_create module=service status=ok category_id={}",
            category.id
        );
        Ok(category)
    }

    /// Applies an update request to a stored category.
    pub fn update_category(&self, request: &UpdateCategoryRequest) -> ServiceResult<Category> {
        request.validate()?;
        let uow = self.factory.create()?;
        let category_id = request.base.category_id;

        run_in_transaction(&uow, |uow| {
            let Some(mut category) = uow.categories().find(category_id)? else {
                return not_found(Category::KIND, category_id);
            };
            request.apply_to(&mut category);
            uow.categories().update(&category)?;
            Ok(category)
        })
    }

    pub fn get_category(&self, id: CategoryId) -> ServiceResult<Option<Category>> {
        let uow = self.factory.create()?;
        Ok(uow.categories().find(id)?)
    }

    pub fn list_categories(&self, owner_id: UserId) -> ServiceResult<Vec<Category>> {
        let uow = self.factory.create()?;
        Ok(uow.categories().list_by_owner(owner_id)?)
    }
}
