//! Defines [`Query`], the cursor a host advances while the template walks
//! its posts. The page size is always supplied by the caller; there is no
//! default.

use crate::post::Post;
use std::num::NonZeroUsize;

/// One page of posts plus a cursor over them.
#[derive(Clone, Debug)]
pub struct Query<'a> {
    posts: &'a [Post],

    /// Index of the next post [`Query::the_post`] will return.
    cursor: usize,

    /// The 1-based page number.
    page: usize,

    /// The number of pages in the result set this page belongs to.
    max_pages: usize,
}

impl<'a> Query<'a> {
    /// Splits `posts` into pages of at most `per_page` posts. An empty
    /// `posts` still yields one (empty) page so the home page always
    /// exists.
    pub fn paginate(posts: &'a [Post], per_page: NonZeroUsize) -> Vec<Query<'a>> {
        if posts.is_empty() {
            return vec![Query {
                posts,
                cursor: 0,
                page: 1,
                max_pages: 1,
            }];
        }

        let max_pages = posts.chunks(per_page.get()).len();
        posts
            .chunks(per_page.get())
            .enumerate()
            .map(|(i, chunk)| Query {
                posts: chunk,
                cursor: 0,
                page: i + 1,
                max_pages,
            })
            .collect()
    }

    /// A query containing exactly `post`.
    pub fn single(post: &'a Post) -> Query<'a> {
        Query {
            posts: std::slice::from_ref(post),
            cursor: 0,
            page: 1,
            max_pages: 1,
        }
    }

    /// Whether the cursor has posts left to visit.
    pub fn have_posts(&self) -> bool {
        self.cursor < self.posts.len()
    }

    /// Advances the cursor and returns the post it was on, or `None` once
    /// the page is exhausted.
    pub fn the_post(&mut self) -> Option<&'a Post> {
        let post = self.posts.get(self.cursor)?;
        self.cursor += 1;
        Some(post)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub fn posts(&self) -> &'a [Post] {
        self.posts
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;
    use url::Url;

    fn posts(n: usize) -> Vec<Post> {
        (0..n)
            .map(|i| Post {
                title: format!("Post {}", i),
                slug: format!("post-{}", i),
                permalink: Url::parse(&format!("https://example.com/post-{}/", i)).unwrap(),
                date: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
                author: String::from("Sam"),
                content: String::new(),
            })
            .collect()
    }

    fn per_page(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_paginate_empty() {
        let posts = posts(0);
        let pages = Query::paginate(&posts, per_page(10));
        assert_eq!(1, pages.len());
        assert!(!pages[0].have_posts());
        assert_eq!(1, pages[0].max_pages());
    }

    #[test]
    fn test_paginate_exact_multiple() {
        let posts = posts(4);
        let pages = Query::paginate(&posts, per_page(2));
        assert_eq!(2, pages.len());
        assert_eq!(vec![1, 2], pages.iter().map(Query::page).collect::<Vec<_>>());
        assert!(pages.iter().all(|q| q.max_pages() == 2 && q.posts().len() == 2));
    }

    #[test]
    fn test_paginate_remainder() {
        let posts = posts(5);
        let pages = Query::paginate(&posts, per_page(2));
        assert_eq!(3, pages.len());
        assert_eq!(1, pages[2].posts().len());
        assert_eq!("Post 4", pages[2].posts()[0].title);
    }

    #[test]
    fn test_paginate_huge_page_size() {
        let posts = posts(3);
        let pages = Query::paginate(&posts, per_page(usize::MAX));
        assert_eq!(1, pages.len());
        assert_eq!(1, pages[0].max_pages());
        assert_eq!(3, pages[0].posts().len());
    }

    #[test]
    fn test_cursor() {
        let posts = posts(2);
        let mut query = Query::paginate(&posts, per_page(10)).remove(0);
        assert!(query.have_posts());
        assert_eq!("Post 0", query.the_post().unwrap().title);
        assert!(query.have_posts());
        assert_eq!("Post 1", query.the_post().unwrap().title);
        assert!(!query.have_posts());
        assert!(query.the_post().is_none());
    }

    #[test]
    fn test_single() {
        let posts = posts(3);
        let mut query = Query::single(&posts[1]);
        assert_eq!("Post 1", query.the_post().unwrap().title);
        assert!(query.the_post().is_none());
    }
}
