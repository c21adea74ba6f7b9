mod hash_tests;
mod settings_codec_tests;
