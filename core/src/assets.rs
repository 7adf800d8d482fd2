use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

pub const GENERATOR_TEMPLATE: &str = "templates/gen.cpp";
pub const RAND_HEADER_TEMPLATE: &str = "templates/rand.h";
pub const BRUTE_TEMPLATE: &str = "templates/main_brute.cpp";

/// Embedded text file, or `None` if no such asset is bundled.
pub fn text(name: &str) -> Option<String> {
    let file = Asset::get(name)?;
    Some(String::from_utf8_lossy(file.data.as_ref()).into_owned())
}
