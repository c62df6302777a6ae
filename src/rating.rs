use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

use crate::config::Query;
use crate::dom;
use crate::error::FieldCause;

/// Feed rating that couldn't be decoded.
pub const UNDECODABLE_FEED_RATING: i32 = -1;
/// Static-page rating left unset because the stars couldn't be counted.
pub const UNDECODED_STATIC_RATING: i32 = 0;

static NON_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]+").unwrap());

/// Decode a feed `style` attribute such as `width: 60%;`. Only the exact
/// breakpoints 20/40/60/80/100 map to a rating.
pub fn decode_style_width(style: &str) -> i32 {
    let digits = NON_DIGIT_RE.replace_all(style, "");
    match digits.parse::<u32>() {
        Ok(20) => 1,
        Ok(40) => 2,
        Ok(60) => 3,
        Ok(80) => 4,
        Ok(100) => 5,
        Ok(other) => {
            tracing::debug!(width = other, "rating width is not a star breakpoint");
            UNDECODABLE_FEED_RATING
        }
        Err(_) => UNDECODABLE_FEED_RATING,
    }
}

/// Count the filled stars below a static-page rating image. No filled star at
/// all means the markup changed, since the store never awards zero stars.
pub fn decode_filled_stars(rating_image: ElementRef<'_>, filled_star: &Query) -> Result<i32, FieldCause> {
    let filled = dom::find_all(rating_image, filled_star).len();
    if filled == 0 {
        return Err(FieldCause::ZeroFilledStars(filled_star.clone()));
    }
    Ok(filled as i32)
}
