/// Returns the first candidate that is present and not blank.
pub fn first_present<'a, 'b, I>(candidates: I) -> Option<&'a str>
where I: IntoIterator<Item = &'b Option<&'a String>>, 'a: 'b
{
    candidates.into_iter()
        .filter_map(|candidate| candidate.map(String::as_str))
        .map(str::trim)
        .find(|value| !value.is_empty())
}
