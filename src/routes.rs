//! Framework-agnostic request handlers.
//!
//! Each handler takes typed parameters, runs one list manager operation and
//! returns a [`Response`] for whatever HTTP layer sits in front. User-visible
//! messages go into the [`Flash`] slot the same way a session flash would.

use crate::list_manager::ListManager;
use crate::models::{List, ListError};
use crate::storage::Storage;
use serde::{Deserialize, Deserializer};

pub const LISTS_PATH: &str = "/lists";
pub const XHR_HEADER: &str = "X-Requested-With";
pub const XHR_VALUE: &str = "XMLHttpRequest";

pub const LIST_CREATED: &str = "The list has been created.";
pub const LIST_UPDATED: &str = "The list has been updated.";
pub const LIST_DELETED: &str = "The list has been deleted.";
pub const TODO_ADDED: &str = "The todo was added.";
pub const TODO_DELETED: &str = "The todo has been deleted.";
pub const TODO_UPDATED: &str = "The todo has been updated.";
pub const TODOS_COMPLETED: &str = "All todos have been completed.";

pub fn list_path(list_id: u64) -> String {
    format!("{}/{}", LISTS_PATH, list_id)
}

/// Per-request facts that change how a handler answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub xhr: bool,
}

impl RequestContext {
    pub fn from_headers<'h, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = (&'h str, &'h str)>,
    {
        let xhr = headers
            .into_iter()
            .any(|(name, value)| name.eq_ignore_ascii_case(XHR_HEADER) && value == XHR_VALUE);
        Self { xhr }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListNameParams {
    pub list_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TodoParams {
    pub todo: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TodoStatusParams {
    #[serde(deserialize_with = "bool_from_form")]
    pub completed: bool,
}

// Form posts send "true"/"false" as text.
fn bool_from_form<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Bool(value) => Ok(value),
        Raw::Text(text) => match text.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(D::Error::custom(format!(
                "expected \"true\" or \"false\", got {:?}",
                other
            ))),
        },
    }
}

/// One-shot messages shown on the next rendered page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flash {
    pub success: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Lists(Vec<List>),
    /// The new list form, refilled with whatever was submitted.
    NewList { list_name: String },
    /// A single list with its todos in display order.
    List(List),
    EditList { list: List, list_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Render(Page),
    Redirect(String),
    NoContent,
    /// A bare success body, sent to asynchronous clients instead of a redirect.
    Body(String),
}

impl Response {
    pub fn status(&self) -> u16 {
        match self {
            Response::Render(_) | Response::Body(_) => 200,
            Response::Redirect(_) => 302,
            Response::NoContent => 204,
        }
    }
}

pub struct App<'a> {
    manager: ListManager<'a>,
    flash: Flash,
}

impl<'a> App<'a> {
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self {
            manager: ListManager::new(storage),
            flash: Flash::default(),
        }
    }

    pub fn flash(&self) -> &Flash {
        &self.flash
    }

    /// Hands the pending messages to the renderer and clears them.
    pub fn take_flash(&mut self) -> Flash {
        std::mem::take(&mut self.flash)
    }

    fn success(&mut self, message: &str) {
        self.flash.success = Some(message.to_string());
    }

    fn error(&mut self, error: &ListError) {
        self.flash.error = Some(error.to_string());
    }

    /// Fallback for errors that leave nothing sensible to re-render.
    fn bail(&mut self, error: ListError) -> Response {
        if error.is_not_found() {
            tracing::debug!(error = %error, "redirecting after lookup miss");
        } else {
            tracing::error!(error = %error, "request failed");
        }
        self.error(&error);
        Response::Redirect(LISTS_PATH.to_string())
    }

    /// `GET /`
    pub fn index(&self) -> Response {
        Response::Redirect(LISTS_PATH.to_string())
    }

    /// `GET /lists`
    pub fn lists(&mut self) -> Response {
        match self.manager.list_all() {
            Ok(lists) => Response::Render(Page::Lists(lists)),
            Err(e) => {
                tracing::error!(error = %e, "failed to load lists");
                self.error(&e);
                Response::Render(Page::Lists(Vec::new()))
            }
        }
    }

    /// `GET /lists/new`
    pub fn new_list(&self) -> Response {
        Response::Render(Page::NewList {
            list_name: String::new(),
        })
    }

    /// `POST /lists`
    pub fn create_list(&mut self, params: ListNameParams) -> Response {
        match self.manager.create_list(&params.list_name) {
            Ok(_) => {
                self.success(LIST_CREATED);
                Response::Redirect(LISTS_PATH.to_string())
            }
            Err(e @ (ListError::InvalidName(_) | ListError::DuplicateName(_))) => {
                self.error(&e);
                Response::Render(Page::NewList {
                    list_name: params.list_name,
                })
            }
            Err(e) => self.bail(e),
        }
    }

    /// `GET /lists/:id`
    pub fn show_list(&mut self, list_id: u64) -> Response {
        match self.manager.find_list_sorted(list_id) {
            Ok(list) => Response::Render(Page::List(list)),
            Err(e) => self.bail(e),
        }
    }

    /// `GET /lists/:id/edit`
    pub fn edit_list(&mut self, list_id: u64) -> Response {
        match self.manager.find_list(list_id) {
            Ok(list) => {
                let list_name = list.name.clone();
                Response::Render(Page::EditList { list, list_name })
            }
            Err(e) => self.bail(e),
        }
    }

    /// `POST /lists/:id`
    pub fn update_list(&mut self, list_id: u64, params: ListNameParams) -> Response {
        match self.manager.rename_list(list_id, &params.list_name) {
            Ok(()) => {
                self.success(LIST_UPDATED);
                Response::Redirect(list_path(list_id))
            }
            Err(e @ (ListError::InvalidName(_) | ListError::DuplicateName(_))) => {
                match self.manager.find_list(list_id) {
                    Ok(list) => {
                        self.error(&e);
                        Response::Render(Page::EditList {
                            list,
                            list_name: params.list_name,
                        })
                    }
                    Err(lookup) => self.bail(lookup),
                }
            }
            Err(e) => self.bail(e),
        }
    }

    /// `POST /lists/:id/destroy`
    pub fn destroy_list(&mut self, ctx: RequestContext, list_id: u64) -> Response {
        match self.manager.delete_list(list_id) {
            Ok(()) if ctx.xhr => Response::Body(LISTS_PATH.to_string()),
            Ok(()) => {
                self.success(LIST_DELETED);
                Response::Redirect(LISTS_PATH.to_string())
            }
            Err(e) => self.bail(e),
        }
    }

    /// `POST /lists/:id/todos`
    pub fn create_todo(&mut self, list_id: u64, params: TodoParams) -> Response {
        match self.manager.add_todo(list_id, &params.todo) {
            Ok(_) => {
                self.success(TODO_ADDED);
                Response::Redirect(list_path(list_id))
            }
            Err(e @ ListError::InvalidName(_)) => match self.manager.find_list_sorted(list_id) {
                Ok(list) => {
                    self.error(&e);
                    Response::Render(Page::List(list))
                }
                Err(lookup) => self.bail(lookup),
            },
            Err(e) => self.bail(e),
        }
    }

    /// `POST /lists/:id/todos/:todo_id/destroy`
    pub fn destroy_todo(&mut self, ctx: RequestContext, list_id: u64, todo_id: u64) -> Response {
        match self.manager.delete_todo(list_id, todo_id) {
            Ok(()) if ctx.xhr => Response::NoContent,
            Ok(()) => {
                self.success(TODO_DELETED);
                Response::Redirect(list_path(list_id))
            }
            Err(e) => self.bail(e),
        }
    }

    /// `POST /lists/:id/todos/:todo_id`
    pub fn update_todo(
        &mut self,
        list_id: u64,
        todo_id: u64,
        params: TodoStatusParams,
    ) -> Response {
        match self
            .manager
            .set_todo_completed(list_id, todo_id, params.completed)
        {
            Ok(()) => {
                self.success(TODO_UPDATED);
                Response::Redirect(list_path(list_id))
            }
            Err(e) => self.bail(e),
        }
    }

    /// `POST /lists/:id/complete_all`
    pub fn complete_all(&mut self, list_id: u64) -> Response {
        match self.manager.complete_all_todos(list_id) {
            Ok(()) => {
                self.success(TODOS_COMPLETED);
                Response::Redirect(list_path(list_id))
            }
            Err(e) => self.bail(e),
        }
    }
}
