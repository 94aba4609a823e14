//! Sample controllers wired against the memory store.
//!
//! Every constructor is generic over the store, so the same declarations are exercised by
//! the mock-based tests and the demo.

pub mod comments;
pub mod employees;
pub mod managers;
pub mod photos;
pub mod tasks;

use crate::store::Schema;

/// Relations and validations backing the sample controllers.
pub fn schema() -> Schema {
    Schema::new()
        // employees: belongs_to :factory, :company, polymorphic: true
        .has_many("factory", "employees", "employee", "factory_id")
        .has_many("company", "employees", "employee", "company_id")
        .belongs_to("employee", "parent", "factory", "factory_id")
        .belongs_to("employee", "parent", "company", "company_id")
        .validates_presence("employee", "name")
        // managers: singleton under store
        .has_one("store", "manager", "manager", "store_id")
        .belongs_to("manager", "store", "store", "store_id")
        .validates_presence("manager", "name")
        // photos: belongs_to :user, :task, polymorphic: true
        .has_many("user", "photos", "photo", "user_id")
        .has_many("task", "photos", "photo", "task_id")
        .belongs_to("photo", "parent", "user", "user_id")
        .belongs_to("photo", "parent", "task", "task_id")
        .validates_presence("photo", "title")
        // projects/tasks/comments
        .has_many("project", "tasks", "task", "project_id")
        .belongs_to("task", "project", "project", "project_id")
        .validates_presence("task", "title")
        .has_many("task", "comments", "comment", "task_id")
        .belongs_to("comment", "task", "task", "task_id")
        .validates_presence("comment", "body")
}
