mod sqlite_tests;
mod app_flow;
mod rpc_session;
