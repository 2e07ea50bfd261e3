mod helpers;

mod api_test;
mod concurrency_test;
mod vote_test;
