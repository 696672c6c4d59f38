use proc_macro::TokenStream;

mod factory;

/// Wrap an application factory so its output is served under its root path
///
/// The annotated function keeps its signature. Whatever `Application` it
/// builds is passed through `pyramidion::wrap_application`. Functions
/// returning a `Result` have only their `Ok` value wrapped; errors are
/// returned unchanged. `async fn` factories are supported.
///
/// # Example
/// ```ignore
/// use pyramidion::{Application, pyramidion};
///
/// #[pyramidion]
/// fn create_app(title: &str) -> Application {
///     Application::builder()
///         .title(title)
///         .root_path("/test")
///         .build()
///         .get("/", || async { "hello world!" })
/// }
/// ```
#[proc_macro_attribute]
pub fn pyramidion(attr: TokenStream, item: TokenStream) -> TokenStream {
    factory::pyramidion_attribute(attr, item)
}
