mod streak_tests;
mod collection_tests;
