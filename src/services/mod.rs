//! Services module - the work that happens off the main context.
//!
//! Services have no knowledge of the main context or the state holder; they
//! return results and leave publishing to the view models in [`crate::ui`].
//!
//! # Components
//!
//! - [`ImageLoader`]: fetches one image over HTTP(S) and decodes it. The async
//!   [`ImageLoader::fetch`] is the single implementation; the callback form
//!   ([`ImageLoader::fetch_with_callback`]) and the one-shot stream form
//!   ([`ImageLoader::fetch_stream`]) wrap it.
//! - [`FetchRequest`] / [`FetchError`]: the request descriptor and the failure
//!   reasons a fetch can end with.
//! - [`TitleProvider`] / [`TitleManager`]: a trivial title source used to show
//!   optional, tagged and propagated failure handling side by side.
//!
//! # Usage Example
//!
//! ```ignore
//! use fetchpub::services::{FetchRequest, ImageLoader};
//!
//! let loader = ImageLoader::new(&config, metrics)?;
//! let request = FetchRequest::parse("https://picsum.photos/200")?;
//! match loader.fetch(&request).await {
//!     Ok(image) => println!("{}", image.describe()),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

pub mod loader;
pub mod title;

pub use loader::{FetchError, FetchRequest, FetchStream, ImageLoader, handle_response};
pub use title::{DEFAULT_TITLE, TitleError, TitleManager, TitleProvider};
