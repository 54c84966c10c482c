#![allow(missing_docs)]

pub(crate) mod db;
pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;

pub(crate) use db::{TEST_PASSWORD, TEST_SECURITY_ANSWER, create_test_user, get_test_connection};
pub(crate) use form::{
    assert_form_error_message, assert_form_input, assert_form_input_with_value,
    assert_form_select, assert_form_submit_button, assert_hx_endpoint, assert_no_form_errors,
    must_get_form,
};
pub(crate) use html::{
    assert_valid_html, page_text, parse_html_document, parse_html_fragment,
    parse_html_fragment_str,
};
pub(crate) use http::{assert_hx_redirect, assert_redirect, get_header};
