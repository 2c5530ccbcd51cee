use crate::model::Listing;

/// True when any keyword occurs in the listing title, ignoring case on both sides.
pub fn matches(listing: &Listing, keywords: &[String]) -> bool {
    let title = listing.title.to_lowercase();

    keywords
        .iter()
        .any(|keyword| title.contains(&keyword.to_lowercase()))
}

pub fn select_matching<'a>(
    listings: impl IntoIterator<Item = &'a Listing>,
    keywords: &'a [String],
) -> impl Iterator<Item = &'a Listing> {
    listings.into_iter().filter(move |l| matches(l, keywords))
}
