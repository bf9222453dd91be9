// Read side of the service: record listing, detail, preview images and score rings.

pub mod card;
pub mod handlers;
pub mod score_circle;
