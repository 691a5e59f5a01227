//! Pagination envelope returned by `Model::paginate`.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub item_count: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub items_per_page: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationLinks {
    pub first: String,
    pub previous: String,
    pub next: String,
    pub last: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
    pub links: PaginationLinks,
}

impl<T> Paginated<T> {
    /// Package one page of `data` out of `total` items. Pages are zero-based;
    /// `previous` and `next` clamp to the first and last page.
    pub fn new(data: Vec<T>, total: u64, page: u64, limit: u64, resource_url: &str) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        let last_page = total_pages.saturating_sub(1);
        let link = |p: u64| format!("{}?page={}&limit={}", resource_url, p, limit);
        let meta = PaginationMeta {
            item_count: data.len() as u64,
            total_items: total,
            total_pages,
            current_page: page,
            items_per_page: limit,
        };
        let links = PaginationLinks {
            first: format!("{}?limit={}", resource_url, limit),
            previous: link(page.saturating_sub(1)),
            next: link(page.saturating_add(1).min(last_page)),
            last: link(last_page),
        };
        Paginated { data, meta, links }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
            links: self.links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_of_eleven() {
        let p = Paginated::new(vec![1, 2, 3, 4], 11, 0, 4, "/api/products");
        assert_eq!(
            p.meta,
            PaginationMeta {
                item_count: 4,
                total_items: 11,
                total_pages: 3,
                current_page: 0,
                items_per_page: 4,
            }
        );
        assert_eq!(p.links.first, "/api/products?limit=4");
        assert_eq!(p.links.previous, "/api/products?page=0&limit=4");
        assert_eq!(p.links.next, "/api/products?page=1&limit=4");
        assert_eq!(p.links.last, "/api/products?page=2&limit=4");
    }

    #[test]
    fn test_next_clamps_at_last_page() {
        let p = Paginated::new(vec![9, 10, 11], 11, 2, 4, "/p");
        assert_eq!(p.links.previous, "/p?page=1&limit=4");
        assert_eq!(p.links.next, "/p?page=2&limit=4");
        assert_eq!(p.meta.item_count, 3);
    }

    #[test]
    fn test_empty_result() {
        let p: Paginated<u8> = Paginated::new(vec![], 0, 0, 10, "/");
        assert_eq!(p.meta.total_pages, 0);
        assert_eq!(p.links.last, "/?page=0&limit=10");
        assert_eq!(p.links.next, "/?page=0&limit=10");
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let p = Paginated::new(vec![1], 1, 0, 1, "/x");
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["meta"]["itemsPerPage"], 1);
        assert_eq!(v["meta"]["totalItems"], 1);
    }
}
