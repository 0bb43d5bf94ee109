// Blog framework - pagination, form validation, authorization and route paths

pub mod forms;
pub mod pagination;
pub mod privacy;
pub mod routes;

pub use forms::{CommentForm, FormData, FormErrors, PostForm, UploadedFile};
pub use pagination::{Page, PageQuery, Paginator, POSTS_PER_PAGE};
pub use privacy::Authorization;
