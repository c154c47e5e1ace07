mod test_forward;
mod test_init_session;
mod test_menu;
