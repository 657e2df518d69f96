mod record;

use proc_macro::TokenStream;

// ============================================================================
// #[derive(Record)]
// ============================================================================

/// Derive macro that implements `minimal_planner::Record`.
///
/// # Usage
///
/// ```ignore
/// #[derive(Serialize, Deserialize, Clone, Record)]
/// #[record(collection = "user")]
/// pub struct User {
///     pub id: String,
///     #[record(unique)]
///     pub email: String,
/// }
/// ```
///
/// Supported attributes:
/// - `#[record(collection = "...")]` on the struct: collection name.
///   Defaults to the snake_case struct name.
/// - `#[record(id)]` on a field: the identifier field. Defaults to `id`.
/// - `#[record(unique)]` on a field: the store rejects a second record with
///   the same value for this field.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record(input)
}
