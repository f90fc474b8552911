/// Whether any of the container's names starts with any of the filters.
///
/// Names may be reported with a leading `/`, which is ignored. An empty
/// filter list matches every container.
pub fn matches_name_filter<N, F>(names: &[N], filters: &[F]) -> bool
where
    N: AsRef<str>,
    F: AsRef<str>,
{
    if filters.is_empty() {
        return true;
    }
    names.iter().any(|name| {
        let name = name.as_ref();
        let name = name.strip_prefix('/').unwrap_or(name);
        filters.iter().any(|filter| name.starts_with(filter.as_ref()))
    })
}
