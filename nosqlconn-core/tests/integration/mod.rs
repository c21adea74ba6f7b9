mod config_tests;
mod fake_redis;
mod profile_store_tests;
mod redis_adapter_tests;
